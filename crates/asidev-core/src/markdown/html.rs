//! HTML serializer for the markdown tree
//!
//! The output goes into a trusted display sink, so everything textual is
//! escaped here and link URLs pass a scheme allow-list before an `<a>` tag
//! is emitted.

use super::ast::{Block, Inline};

const ALLOWED_SCHEMES: &[&str] = &["http", "https", "mailto"];

/// Escape text for use in HTML content or attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

/// A URL may carry no scheme (relative) or one from the allow-list.
fn url_allowed(url: &str) -> bool {
    match url.split_once(':') {
        Some((scheme, _)) => ALLOWED_SCHEMES.contains(&scheme.to_ascii_lowercase().as_str()),
        None => true,
    }
}

/// Serialize a block tree to an HTML fragment.
pub fn render_blocks(blocks: &[Block]) -> String {
    let mut html = String::new();
    for block in blocks {
        match block {
            Block::Heading { level, inlines } => {
                html.push_str(&format!(
                    "<h{level}>{}</h{level}>",
                    render_inlines(inlines),
                    level = level
                ));
            }
            Block::CodeBlock { lang, code } => {
                match lang {
                    Some(lang) => html.push_str(&format!(
                        "<pre><code class=\"language-{}\">{}</code></pre>",
                        escape(lang),
                        escape(code)
                    )),
                    None => html.push_str(&format!("<pre><code>{}</code></pre>", escape(code))),
                }
            }
            Block::List { ordered, items } => {
                let tag = if *ordered { "ol" } else { "ul" };
                html.push_str(&format!("<{tag}>"));
                for item in items {
                    html.push_str(&format!("<li>{}</li>", render_inlines(item)));
                }
                html.push_str(&format!("</{tag}>"));
            }
            Block::Blockquote(inlines) => {
                html.push_str(&format!("<blockquote>{}</blockquote>", render_inlines(inlines)));
            }
            Block::Paragraph(lines) => {
                let body: Vec<String> = lines.iter().map(|l| render_inlines(l)).collect();
                html.push_str(&format!("<p>{}</p>", body.join("<br />")));
            }
        }
    }
    html
}

fn render_inlines(inlines: &[Inline]) -> String {
    let mut out = String::new();
    for inline in inlines {
        match inline {
            Inline::Text(text) => out.push_str(&escape(text)),
            Inline::Strong(children) => {
                out.push_str("<strong>");
                out.push_str(&render_inlines(children));
                out.push_str("</strong>");
            }
            Inline::Emph(children) => {
                out.push_str("<em>");
                out.push_str(&render_inlines(children));
                out.push_str("</em>");
            }
            Inline::Code(code) => {
                out.push_str("<code>");
                out.push_str(&escape(code));
                out.push_str("</code>");
            }
            Inline::Link { label, url } => {
                let label_html = render_inlines(label);
                if url_allowed(url) {
                    out.push_str(&format!(
                        "<a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">{}</a>",
                        escape(url),
                        label_html
                    ));
                } else {
                    // disallowed scheme: keep the text, drop the hyperlink
                    out.push_str(&label_html);
                }
            }
        }
    }
    out
}
