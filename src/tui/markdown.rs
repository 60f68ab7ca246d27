use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

/// Render markdown into ratatui lines, GitHub-flavored and line-break
/// preserving: soft breaks become real line breaks, fenced code blocks keep
/// their content verbatim, and raw HTML is shown as literal text instead of
/// being interpreted.
pub fn render_markdown(text: &str) -> Vec<Line<'static>> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut renderer = Renderer::default();
    for event in Parser::new_ext(text, options) {
        renderer.handle(event);
    }
    renderer.into_lines()
}

#[derive(Default)]
struct Renderer {
    lines: Vec<Line<'static>>,
    spans: Vec<Span<'static>>,
    modifiers: Modifier,
    heading: bool,
    in_code_block: bool,
    // One entry per open list; Some holds the next ordered-item number.
    list_stack: Vec<Option<u64>>,
}

impl Renderer {
    fn handle(&mut self, event: Event) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => self.text(&text),
            // Raw HTML stays literal text; nothing is interpreted.
            Event::Html(html) => {
                let mut first = true;
                for piece in html.trim_end_matches('\n').split('\n') {
                    if !first {
                        self.flush_line();
                    }
                    first = false;
                    self.text(piece);
                }
            }
            Event::Code(code) => self.spans.push(Span::styled(
                code.into_string(),
                Style::default().fg(Color::Yellow),
            )),
            Event::SoftBreak | Event::HardBreak => self.flush_line(),
            Event::Rule => {
                self.flush_line();
                self.lines.push(Line::from(Span::styled(
                    "────────".to_string(),
                    Style::default().fg(Color::DarkGray),
                )));
            }
            Event::TaskListMarker(checked) => {
                let marker = if checked { "[x] " } else { "[ ] " };
                self.spans.push(Span::raw(marker.to_string()));
            }
            Event::FootnoteReference(_) => {}
        }
    }

    fn start(&mut self, tag: Tag) {
        match tag {
            Tag::Paragraph => {}
            Tag::Heading(..) => {
                self.flush_line();
                self.heading = true;
            }
            Tag::CodeBlock(kind) => {
                self.flush_line();
                if let CodeBlockKind::Fenced(lang) = kind {
                    if !lang.is_empty() {
                        self.lines.push(Line::from(Span::styled(
                            format!("· {lang}"),
                            Style::default().fg(Color::DarkGray),
                        )));
                    }
                }
                self.in_code_block = true;
            }
            Tag::List(start) => self.list_stack.push(start),
            Tag::Item => {
                self.flush_line();
                let prefix = match self.list_stack.last_mut() {
                    Some(Some(index)) => {
                        let label = format!("{index}. ");
                        *index += 1;
                        label
                    }
                    _ => "• ".to_string(),
                };
                let indent = "  ".repeat(self.list_stack.len().saturating_sub(1));
                self.spans.push(Span::raw(format!("{indent}{prefix}")));
            }
            Tag::BlockQuote => {
                self.flush_line();
                self.modifiers |= Modifier::ITALIC;
            }
            Tag::Emphasis => self.modifiers |= Modifier::ITALIC,
            Tag::Strong => self.modifiers |= Modifier::BOLD,
            Tag::Strikethrough => self.modifiers |= Modifier::CROSSED_OUT,
            Tag::Link(..) => self.modifiers |= Modifier::UNDERLINED,
            Tag::Image(..) => {}
            Tag::Table(_) | Tag::TableHead | Tag::TableRow => self.flush_line(),
            Tag::TableCell => {}
            Tag::FootnoteDefinition(_) => {}
        }
    }

    fn end(&mut self, tag: Tag) {
        match tag {
            Tag::Paragraph => {
                self.flush_line();
                self.blank_line();
            }
            Tag::Heading(..) => {
                self.heading = false;
                self.flush_line();
                self.blank_line();
            }
            Tag::CodeBlock(_) => {
                self.in_code_block = false;
                self.flush_line();
                self.blank_line();
            }
            Tag::List(_) => {
                self.flush_line();
                self.list_stack.pop();
                if self.list_stack.is_empty() {
                    self.blank_line();
                }
            }
            Tag::Item => self.flush_line(),
            Tag::BlockQuote => {
                self.modifiers -= Modifier::ITALIC;
                self.flush_line();
                self.blank_line();
            }
            Tag::Emphasis => self.modifiers -= Modifier::ITALIC,
            Tag::Strong => self.modifiers -= Modifier::BOLD,
            Tag::Strikethrough => self.modifiers -= Modifier::CROSSED_OUT,
            Tag::Link(..) => self.modifiers -= Modifier::UNDERLINED,
            Tag::TableRow | Tag::TableHead => self.flush_line(),
            Tag::TableCell => self.spans.push(Span::raw("  ".to_string())),
            Tag::Image(..) | Tag::Table(_) | Tag::FootnoteDefinition(_) => {}
        }
    }

    fn text(&mut self, text: &str) {
        if self.in_code_block {
            // Code block content is emitted verbatim, one styled line per
            // source line.
            let style = Style::default().fg(Color::Green);
            let mut first = true;
            for piece in text.split('\n') {
                if !first {
                    self.flush_line();
                }
                first = false;
                if !piece.is_empty() {
                    self.spans.push(Span::styled(piece.to_string(), style));
                }
            }
            return;
        }

        let style = if self.heading {
            Style::default()
                .fg(Color::LightBlue)
                .add_modifier(Modifier::BOLD | self.modifiers)
        } else {
            Style::default().add_modifier(self.modifiers)
        };
        self.spans.push(Span::styled(text.to_string(), style));
    }

    fn flush_line(&mut self) {
        if !self.spans.is_empty() {
            let spans = std::mem::take(&mut self.spans);
            self.lines.push(Line::from(spans));
        }
    }

    fn blank_line(&mut self) {
        if !matches!(self.lines.last(), Some(line) if is_blank(line)) {
            self.lines.push(Line::from(""));
        }
    }

    fn into_lines(mut self) -> Vec<Line<'static>> {
        self.flush_line();
        while matches!(self.lines.last(), Some(line) if is_blank(line)) {
            self.lines.pop();
        }
        self.lines
    }
}

fn is_blank(line: &Line) -> bool {
    line.spans.iter().all(|span| span.content.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    fn rendered_text(lines: &[Line]) -> Vec<String> {
        lines.iter().map(line_text).collect()
    }

    #[test]
    fn plain_paragraph_is_one_line() {
        let lines = render_markdown("Hello there");
        assert_eq!(rendered_text(&lines), vec!["Hello there"]);
    }

    #[test]
    fn soft_breaks_are_preserved_as_line_breaks() {
        let lines = render_markdown("first\nsecond");
        assert_eq!(rendered_text(&lines), vec!["first", "second"]);
    }

    #[test]
    fn strong_text_is_bold() {
        let lines = render_markdown("a **bold** word");
        let bold = lines[0]
            .spans
            .iter()
            .find(|s| s.content.as_ref() == "bold")
            .unwrap();
        assert!(bold.style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn fenced_code_block_keeps_content_verbatim() {
        let lines = render_markdown("```rust\nlet x = 1;\nlet y = 2;\n```");
        let text = rendered_text(&lines);
        assert_eq!(text[0], "· rust");
        assert_eq!(text[1], "let x = 1;");
        assert_eq!(text[2], "let y = 2;");
        let code_span = &lines[1].spans[0];
        assert_eq!(code_span.style.fg, Some(Color::Green));
    }

    #[test]
    fn raw_html_is_rendered_as_literal_text() {
        let lines = render_markdown("before\n\n<div>inside</div>\n\nafter");
        let joined = rendered_text(&lines).join("\n");
        assert!(joined.contains("<div>inside</div>"));
    }

    #[test]
    fn ordered_list_is_numbered() {
        let lines = render_markdown("1. one\n2. two");
        let text = rendered_text(&lines);
        assert_eq!(text[0], "1. one");
        assert_eq!(text[1], "2. two");
    }

    #[test]
    fn unordered_list_uses_bullets() {
        let lines = render_markdown("- alpha\n- beta");
        let text = rendered_text(&lines);
        assert_eq!(text[0], "• alpha");
        assert_eq!(text[1], "• beta");
    }

    #[test]
    fn heading_is_styled() {
        let lines = render_markdown("# Title\n\nbody");
        assert_eq!(line_text(&lines[0]), "Title");
        assert!(lines[0].spans[0]
            .style
            .add_modifier
            .contains(Modifier::BOLD));
    }

    #[test]
    fn empty_input_renders_nothing() {
        assert!(render_markdown("").is_empty());
    }
}
