//! Block and inline tree for the Markdown subset the assistant emits

/// Block-level node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// `# ` / `## ` / `### ` heading, level 1-3.
    Heading { level: u8, inlines: Vec<Inline> },
    /// Triple-backtick fenced region. `lang` is the tag on the opening
    /// fence line, when one is present.
    CodeBlock { lang: Option<String>, code: String },
    /// One container per source block that held any list items.
    List {
        ordered: bool,
        items: Vec<Vec<Inline>>,
    },
    /// A single `> ` line.
    Blockquote(Vec<Inline>),
    /// Plain block; one inner entry per source line.
    Paragraph(Vec<Vec<Inline>>),
}

/// Inline-level node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Strong(Vec<Inline>),
    Emph(Vec<Inline>),
    /// Single-backtick span; contents are literal.
    Code(String),
    Link { label: Vec<Inline>, url: String },
}

impl Inline {
    /// Plain-text literal, mostly a test convenience.
    pub fn text(s: impl Into<String>) -> Self {
        Inline::Text(s.into())
    }
}
