pub mod app;
pub mod input;
pub mod markdown;
pub mod ui;

use crate::config::GeminiConfig;
use crate::gemini::GeminiClient;
use anyhow::Result;
use app::ChartyApp;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers,
        MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{io, sync::Arc, time::Duration};

/// Run the full-screen chat client until the user quits.
pub async fn run(config: GeminiConfig) -> Result<()> {
    let gateway = Arc::new(GeminiClient::new(config.clone()));
    let mut app = ChartyApp::new(gateway, config.text_model, config.image_model);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app, Duration::from_millis(50)).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

/// Main event loop: drain response events, draw, then handle one input
/// event. All state mutation stays on this task.
async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut ChartyApp,
    tick_rate: Duration,
) -> Result<()> {
    loop {
        app.poll_events();
        terminal.draw(|f| ui::render_ui(f, app))?;

        if !event::poll(tick_rate)? {
            continue;
        }
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    return Ok(());
                }
                KeyCode::Esc => return Ok(()),
                KeyCode::Enter if key.modifiers.contains(KeyModifiers::ALT) => {
                    if !app.is_busy() {
                        app.input.newline();
                    }
                }
                KeyCode::Enter => app.on_enter(),
                KeyCode::Char(c) => {
                    if !app.is_busy() {
                        app.input.push_char(c);
                    }
                }
                KeyCode::Backspace => {
                    if !app.is_busy() {
                        app.input.pop_char();
                    }
                }
                KeyCode::Up => app.scroll_up(),
                KeyCode::Down => app.scroll_down(),
                _ => {}
            },
            Event::Mouse(mouse) => match mouse.kind {
                MouseEventKind::ScrollUp => app.scroll_up(),
                MouseEventKind::ScrollDown => app.scroll_down(),
                _ => {}
            },
            _ => {}
        }
    }
}
