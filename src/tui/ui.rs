use crate::chat::{Message, MessageAuthor};
use crate::tui::{app::ChartyApp, markdown};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

const TYPING_INDICATOR: &str = "▌";

/// Render the main UI: status bar, transcript, input box.
pub fn render_ui(f: &mut Frame, app: &mut ChartyApp) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Status bar
            Constraint::Min(5),    // Transcript
            Constraint::Length(3), // Input box
        ])
        .split(f.size());

    render_status_bar(f, app, chunks[0]);
    render_transcript(f, app, chunks[1]);
    render_input_box(f, app, chunks[2]);
}

fn render_status_bar(f: &mut Frame, app: &ChartyApp, area: Rect) {
    let state = if app.is_busy() {
        Span::styled("responding…", Style::default().fg(Color::Yellow))
    } else {
        Span::styled("ready", Style::default().fg(Color::Green))
    };
    let status_line = Line::from(vec![
        Span::styled("Chat: ", Style::default().fg(Color::Gray)),
        Span::styled(app.text_model().to_string(), Style::default().fg(Color::Green)),
        Span::styled(" | Images: ", Style::default().fg(Color::Gray)),
        Span::styled(
            app.image_model().to_string(),
            Style::default().fg(Color::Green),
        ),
        Span::styled(" | ", Style::default().fg(Color::Gray)),
        state,
    ]);

    let status_bar = Paragraph::new(status_line)
        .block(Block::default().borders(Borders::ALL).title("Charty AI"));
    f.render_widget(status_bar, area);
}

fn render_transcript(f: &mut Frame, app: &mut ChartyApp, area: Rect) {
    if app.conversation().is_empty() {
        render_welcome(f, area);
        app.set_max_scroll(0);
        return;
    }

    let mut lines: Vec<Line> = Vec::new();
    for msg in app.conversation().messages() {
        lines.extend(message_lines(msg));
    }

    // Auto-scroll pins the viewport to the newest line; manual scrolling is
    // clamped to the transcript length.
    let available_height = area.height.saturating_sub(2);
    let total_lines = lines.len() as u16;
    app.set_max_scroll(total_lines.saturating_sub(available_height));
    let offset = app.effective_scroll();

    let transcript = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Conversation"))
        .wrap(Wrap { trim: false })
        .scroll((offset, 0));
    f.render_widget(transcript, area);
}

/// Shown until the first message is appended.
fn render_welcome(f: &mut Frame, area: Rect) {
    let dim = Style::default().fg(Color::Gray);
    let hint = Style::default().fg(Color::DarkGray);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "✦ Charty AI",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "Your creative partner for code, content, and visuals.",
            dim,
        )),
        Line::from(Span::styled("Ready to build, analyze, or imagine?", dim)),
        Line::from(""),
        Line::from(vec![
            Span::styled("Generate code     ", Style::default().fg(Color::White)),
            Span::styled(
                "\"Create a button component with a hover effect\"",
                hint,
            ),
        ]),
        Line::from(vec![
            Span::styled("Create images     ", Style::default().fg(Color::White)),
            Span::styled(
                "\"/image a cat programming on a laptop, neon style\"",
                hint,
            ),
        ]),
        Line::from(vec![
            Span::styled("Analyze documents ", Style::default().fg(Color::White)),
            Span::styled(
                "\"/attach report.pdf\", then ask \"Summarize this document\"",
                hint,
            ),
        ]),
        Line::from(vec![
            Span::styled("Ask anything      ", Style::default().fg(Color::White)),
            Span::styled(
                "\"Explain the difference between REST and GraphQL\"",
                hint,
            ),
        ]),
    ];

    let welcome = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Conversation"))
        .wrap(Wrap { trim: false })
        .alignment(ratatui::layout::Alignment::Center);
    f.render_widget(welcome, area);
}

/// Map one stored message to transcript lines: author label, file chip,
/// image block or markdown body, and the typing indicator while loading.
fn message_lines(msg: &Message) -> Vec<Line<'static>> {
    let (author, color) = match msg.author {
        MessageAuthor::User => ("You", Color::Cyan),
        MessageAuthor::Ai => ("Charty AI", Color::Green),
    };

    let mut lines = vec![Line::from(vec![
        Span::styled(
            author.to_string(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  {}", msg.created_at.format("%H:%M")),
            Style::default().fg(Color::DarkGray),
        ),
    ])];

    if let Some(file) = &msg.attached_file {
        lines.push(Line::from(Span::styled(
            format!("📎 {}", file.name),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )));
    }

    if let Some(image_url) = &msg.image_url {
        if !msg.text.is_empty() {
            lines.push(Line::from(msg.text.clone()));
        }
        lines.push(Line::from(Span::styled(
            format!("[generated image · ~{} KB]", estimate_kb(image_url)),
            Style::default().fg(Color::Magenta),
        )));
    } else {
        lines.extend(markdown::render_markdown(&msg.text));
    }

    if msg.is_loading {
        let indicator = Span::styled(
            TYPING_INDICATOR.to_string(),
            Style::default().fg(Color::Cyan),
        );
        let has_body = lines.len() > 1;
        match lines.last_mut() {
            Some(last) if has_body => last.spans.push(indicator),
            _ => lines.push(Line::from(indicator)),
        }
    }

    lines.push(Line::from(""));
    lines
}

/// Decoded size of a base64 data URL, for the image placeholder block.
fn estimate_kb(data_url: &str) -> usize {
    let payload_len = data_url.split_once(',').map_or(0, |(_, data)| data.len());
    payload_len * 3 / 4 / 1024
}

fn render_input_box(f: &mut Frame, app: &ChartyApp, area: Rect) {
    let mut title: Vec<Span> = Vec::new();
    if app.is_busy() {
        title.push(Span::styled(
            "Waiting for Charty…",
            Style::default().fg(Color::DarkGray),
        ));
    } else if let Some(notice) = app.notice() {
        title.push(Span::styled(
            notice.to_string(),
            Style::default().fg(Color::Yellow),
        ));
    } else {
        title.push(Span::raw(
            "Ask Charty (Enter to send · try '/image a futuristic robot' or '/attach <path>')",
        ));
    }
    if let Some(file) = app.input.pending_file() {
        title.push(Span::styled(
            format!(" 📎 {}", file.name),
            Style::default().fg(Color::Cyan),
        ));
    }

    let input = Paragraph::new(app.input.draft())
        .style(Style::default().fg(if app.is_busy() {
            Color::DarkGray
        } else {
            Color::White
        }))
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(Line::from(title)),
        );
    f.render_widget(input, area);

    if !app.is_busy() {
        let last_line = app.input.draft().lines().last().unwrap_or("");
        f.set_cursor(
            area.x + last_line.chars().count() as u16 + 1,
            area.y + 1 + app.input.draft().matches('\n').count() as u16,
        );
    }
}
