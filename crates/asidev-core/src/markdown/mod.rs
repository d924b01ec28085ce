//! Markdown-subset rendering for assistant responses
//!
//! A small tokenizer/parser builds a block tree which separate serializers
//! turn into output markup; the supported subset is headings 1-3, bold,
//! italic, fenced and inline code, flat lists, single-line blockquotes, and
//! links.
//!
//! `render` is deliberately re-run from scratch against the growing response
//! prefix on every reveal tick. A fence or span whose closing delimiter has
//! not arrived yet renders in its incomplete form until a later tick
//! completes it; that flicker is accepted, not corrected.

pub mod ast;
mod html;
mod parser;

pub use ast::{Block, Inline};
pub use html::{escape, render_blocks};
pub use parser::parse;

use crate::state::{ChatMessage, ChatRole};

/// Render markdown `text` to an HTML fragment. Pure, deterministic, and
/// total: unrecognized syntax passes through as literal text.
pub fn render(text: &str) -> String {
    render_blocks(&parse(text))
}

/// Render a whole conversation as a standalone HTML page.
///
/// User messages are escaped plain text; assistant messages go through the
/// markdown renderer.
pub fn render_document(title: &str, messages: &[ChatMessage]) -> String {
    let mut page = String::new();
    page.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\" />\n");
    page.push_str(&format!("<title>{}</title>\n", escape(title)));
    page.push_str("</head>\n<body>\n");
    for message in messages {
        match message.role {
            ChatRole::User => {
                page.push_str("<section class=\"user\"><p>");
                let lines: Vec<String> = message.content.lines().map(escape).collect();
                page.push_str(&lines.join("<br />"));
                page.push_str("</p></section>\n");
            }
            ChatRole::Assistant => {
                page.push_str("<section class=\"assistant\">");
                page.push_str(&render(&message.content));
                page.push_str("</section>\n");
            }
        }
    }
    page.push_str("</body>\n</html>\n");
    page
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_is_stable_for_syntax_free_text() {
        // Re-rendering already-plain output changes nothing.
        let first = render("no markup here");
        assert_eq!(first, "<p>no markup here</p>");
        assert_eq!(render("no markup here"), first);
    }

    #[test]
    fn document_escapes_user_text_and_renders_assistant_markdown() {
        let messages = vec![
            ChatMessage::user("look: <script>"),
            ChatMessage::assistant("**sure**"),
        ];
        let page = render_document("Session", &messages);
        assert!(page.contains("&lt;script&gt;"));
        assert!(page.contains("<strong>sure</strong>"));
        assert!(page.starts_with("<!DOCTYPE html>"));
    }

    #[test]
    fn document_title_is_escaped() {
        let page = render_document("a < b", &[]);
        assert!(page.contains("<title>a &lt; b</title>"));
    }
}
