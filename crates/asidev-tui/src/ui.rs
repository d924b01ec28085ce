use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use asidev_core::markdown::{parse, Block as MdBlock, Inline};
use asidev_core::ChatRole;

use crate::app::{App, InputMode};

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, chat, input, footer
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);

    if app.show_api_key_input {
        render_api_key_input(app, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let identity = match &app.user {
        Some(user) => format!(" {} ", user.name),
        None => " not signed in ".to_string(),
    };

    let title = Line::from(vec![
        Span::styled(" Asidev ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
        Span::raw(" "),
        Span::styled(identity, Style::default().fg(Color::White)),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    // Store chat area dimensions for scroll calculations (inner size minus borders)
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);

    let title = if app.client.is_some() {
        format!(" {} ", app.config.model())
    } else {
        " offline: canned replies (press K to set an API key) ".to_string()
    };

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(title);

    let mut lines: Vec<Line> = Vec::new();
    for msg in &app.chat_messages {
        match msg.role {
            ChatRole::User => {
                lines.push(Line::from(Span::styled(
                    "You:",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )));
                for line in msg.content.lines() {
                    lines.push(Line::from(line.to_string()));
                }
                lines.push(Line::default());
            }
            ChatRole::Assistant => {
                lines.push(Line::from(Span::styled(
                    "Asidev:",
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                )));
                lines.extend(markdown_lines(&msg.content));
                lines.push(Line::default());
            }
        }
    }

    if app.is_generating {
        lines.push(Line::from(Span::styled(
            "Asidev:",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )));
        if app.current_response.is_empty() {
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            lines.push(Line::from(Span::styled(
                format!("Thinking{dots}"),
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            )));
        } else {
            // The growing prefix is re-rendered from scratch on every tick
            let mut revealed = markdown_lines(&app.current_response);
            let cursor = Span::styled("▌", Style::default().fg(Color::Cyan));
            match revealed.last_mut() {
                Some(last) => last.spans.push(cursor),
                None => revealed.push(Line::from(cursor)),
            }
            lines.extend(revealed);
        }
    }

    let chat = Paragraph::new(Text::from(lines))
        .block(chat_block)
        .wrap(Wrap { trim: true })
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

/// Map an assistant message's markdown tree onto styled terminal lines.
fn markdown_lines(content: &str) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    for block in parse(content) {
        match block {
            MdBlock::Heading { level, inlines } => {
                let style = Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD);
                let mut spans = vec![Span::styled(
                    format!("{} ", "#".repeat(level as usize)),
                    style,
                )];
                spans.extend(inline_spans(&inlines, style));
                lines.push(Line::from(spans));
            }
            MdBlock::CodeBlock { lang, code } => {
                if let Some(lang) = lang {
                    lines.push(Line::from(Span::styled(
                        format!("[{lang}]"),
                        Style::default().fg(Color::DarkGray),
                    )));
                }
                for code_line in code.lines() {
                    lines.push(Line::from(Span::styled(
                        format!("  {code_line}"),
                        Style::default().fg(Color::Green),
                    )));
                }
            }
            MdBlock::List { ordered, items } => {
                for (i, item) in items.iter().enumerate() {
                    let marker = if ordered {
                        format!(" {}. ", i + 1)
                    } else {
                        " • ".to_string()
                    };
                    let mut spans = vec![Span::styled(marker, Style::default().fg(Color::Cyan))];
                    spans.extend(inline_spans(item, Style::default()));
                    lines.push(Line::from(spans));
                }
            }
            MdBlock::Blockquote(inlines) => {
                let mut spans = vec![Span::styled(" │ ", Style::default().fg(Color::DarkGray))];
                spans.extend(inline_spans(
                    &inlines,
                    Style::default()
                        .fg(Color::DarkGray)
                        .add_modifier(Modifier::ITALIC),
                ));
                lines.push(Line::from(spans));
            }
            MdBlock::Paragraph(para_lines) => {
                for inlines in &para_lines {
                    lines.push(Line::from(inline_spans(inlines, Style::default())));
                }
            }
        }
    }

    lines
}

fn inline_spans(inlines: &[Inline], base: Style) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    for inline in inlines {
        match inline {
            Inline::Text(text) => spans.push(Span::styled(text.clone(), base)),
            Inline::Strong(children) => {
                spans.extend(inline_spans(children, base.add_modifier(Modifier::BOLD)));
            }
            Inline::Emph(children) => {
                spans.extend(inline_spans(children, base.add_modifier(Modifier::ITALIC)));
            }
            Inline::Code(code) => {
                spans.push(Span::styled(
                    code.clone(),
                    Style::default().fg(Color::Green),
                ));
            }
            Inline::Link { label, url } => {
                spans.extend(inline_spans(
                    label,
                    base.fg(Color::Blue).add_modifier(Modifier::UNDERLINED),
                ));
                spans.push(Span::styled(
                    format!(" ({url})"),
                    Style::default().fg(Color::DarkGray),
                ));
            }
        }
    }
    spans
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing && !app.show_api_key_input;
    let border_color = if editing { Color::Yellow } else { Color::DarkGray };

    let title = if app.is_generating {
        " Generating... (Esc to stop) "
    } else {
        " Ask a development question "
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Calculate visible portion of input with horizontal scrolling
    // Inner width = total width - 2 (for borders)
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.draft_cursor;

    // Calculate scroll offset to keep cursor visible
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app
        .draft
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);

    frame.render_widget(input, area);

    if editing {
        let cursor_x = (cursor_pos - scroll_offset).min(inner_width) as u16;
        frame.set_cursor_position((area.x + 1 + cursor_x, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };
    let mode_text = match app.input_mode {
        InputMode::Normal => " NORMAL ",
        InputMode::Editing => " INPUT ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let mut spans = vec![Span::styled(mode_text, mode_style)];

    if let Some(status) = &app.status {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(
            status.clone(),
            Style::default().fg(Color::DarkGray),
        ));
    } else {
        let hints = match app.input_mode {
            InputMode::Editing => vec![
                Span::styled(" Enter ", key_style),
                Span::styled(" send ", label_style),
                Span::styled(" Esc ", key_style),
                Span::styled(
                    if app.is_generating { " stop " } else { " normal " },
                    label_style,
                ),
            ],
            InputMode::Normal => vec![
                Span::styled(" i ", key_style),
                Span::styled(" input ", label_style),
                Span::styled(" j/k ", key_style),
                Span::styled(" scroll ", label_style),
                Span::styled(" n ", key_style),
                Span::styled(" new ", label_style),
                Span::styled(" e ", key_style),
                Span::styled(" export ", label_style),
                Span::styled(" K ", key_style),
                Span::styled(" key ", label_style),
                Span::styled(" L ", key_style),
                Span::styled(" sign in ", label_style),
                Span::styled(" O ", key_style),
                Span::styled(" sign out ", label_style),
                Span::styled(" q ", key_style),
                Span::styled(" quit ", label_style),
            ],
        };
        spans.extend(hints);
    }

    let footer = Paragraph::new(Line::from(spans));
    frame.render_widget(footer, area);
}

fn render_api_key_input(app: &App, frame: &mut Frame, area: Rect) {
    // Calculate popup size and position (centered)
    let popup_width = 60.min(area.width.saturating_sub(4));
    let popup_height = 7;

    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Enter DeepSeek API Key ");

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    // Instructions
    let instructions =
        Paragraph::new("Paste your API key below. Press Enter to save, Esc to cancel.")
            .style(Style::default().fg(Color::DarkGray));

    let instructions_area = Rect::new(inner.x, inner.y, inner.width, 1);
    frame.render_widget(instructions, instructions_area);

    // Input field
    let input_area = Rect::new(inner.x, inner.y + 2, inner.width, 1);

    // Mask the key with asterisks for security (show last 4 chars)
    let display_text = if app.api_key_input.is_empty() {
        String::new()
    } else if app.api_key_input.chars().count() <= 4 {
        "*".repeat(app.api_key_input.chars().count())
    } else {
        let masked_len = app.api_key_input.chars().count() - 4;
        let last_four: String = app.api_key_input.chars().skip(masked_len).collect();
        format!("{}...{}", "*".repeat(masked_len.min(20)), last_four)
    };

    let input = Paragraph::new(display_text).style(Style::default().fg(Color::Cyan));
    frame.render_widget(input, input_area);

    // Show cursor
    let cursor_x = app.api_key_input_cursor.min(input_area.width as usize) as u16;
    frame.set_cursor_position((input_area.x + cursor_x, input_area.y));

    // Status line
    let char_count = format!("{} characters", app.api_key_input.chars().count());
    let status = Paragraph::new(char_count).style(Style::default().fg(Color::DarkGray));

    let status_area = Rect::new(inner.x, inner.y + 4, inner.width, 1);
    frame.render_widget(status, status_area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headings_render_with_their_marker() {
        let lines = markdown_lines("## Setup");
        assert_eq!(lines.len(), 1);
        let text: String = lines[0].spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(text, "## Setup");
    }

    #[test]
    fn ordered_lists_renumber_positionally() {
        let lines = markdown_lines("5. first\n9. second");
        let first: String = lines[0].spans.iter().map(|s| s.content.as_ref()).collect();
        let second: String = lines[1].spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(first, " 1. first");
        assert_eq!(second, " 2. second");
    }

    #[test]
    fn code_blocks_indent_each_line() {
        let lines = markdown_lines("```rust\nlet x = 1;\n```");
        let tag: String = lines[0].spans.iter().map(|s| s.content.as_ref()).collect();
        let code: String = lines[1].spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(tag, "[rust]");
        assert_eq!(code, "  let x = 1;");
    }

    #[test]
    fn bold_spans_carry_the_bold_modifier() {
        let lines = markdown_lines("**hey**");
        let bold = lines[0]
            .spans
            .iter()
            .find(|s| s.content.as_ref() == "hey")
            .expect("bold span present");
        assert!(bold.style.add_modifier.contains(Modifier::BOLD));
    }
}
