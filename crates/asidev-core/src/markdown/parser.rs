//! Tokenizer and block parser for the Markdown subset
//!
//! Total by construction: anything that does not match a recognized form
//! stays in the output as literal text. The parser is re-run against the
//! growing response prefix on every reveal tick, so a fence or span whose
//! closing delimiter has not arrived yet parses in its incomplete form
//! until a later tick completes it.

use super::ast::{Block, Inline};

/// Fenced code regions are cut out before any block splitting because a
/// fence may span blank lines.
enum Segment {
    Text(String),
    Code { lang: Option<String>, code: String },
}

/// Parse `input` into a block tree.
pub fn parse(input: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    for segment in split_fences(input) {
        match segment {
            Segment::Code { lang, code } => blocks.push(Block::CodeBlock { lang, code }),
            Segment::Text(text) => parse_text_blocks(&text, &mut blocks),
        }
    }
    blocks
}

fn split_fences(input: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut rest = input;
    while let Some(start) = rest.find("```") {
        if start > 0 {
            segments.push(Segment::Text(rest[..start].to_string()));
        }
        let after = &rest[start + 3..];
        let (body, remainder) = match after.find("```") {
            Some(end) => (&after[..end], &after[end + 3..]),
            // An unclosed fence swallows the rest of the input; the closing
            // fence usually arrives on a later reveal tick.
            None => (after, ""),
        };
        segments.push(code_segment(body));
        rest = remainder;
    }
    if !rest.is_empty() {
        segments.push(Segment::Text(rest.to_string()));
    }
    segments
}

/// Split a fenced body into an optional language tag and the code itself.
fn code_segment(body: &str) -> Segment {
    match body.split_once('\n') {
        None => Segment::Code {
            lang: None,
            code: body.to_string(),
        },
        Some((first, code)) => {
            let tag = first.trim();
            let looks_like_lang = !tag.is_empty()
                && tag.len() <= 24
                && tag
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '#' | '.'));
            if looks_like_lang {
                Segment::Code {
                    lang: Some(tag.to_string()),
                    code: code.to_string(),
                }
            } else if tag.is_empty() {
                Segment::Code {
                    lang: None,
                    code: code.to_string(),
                }
            } else {
                Segment::Code {
                    lang: None,
                    code: body.to_string(),
                }
            }
        }
    }
}

/// Split non-code text on blank lines and classify each block.
fn parse_text_blocks(text: &str, blocks: &mut Vec<Block>) {
    for raw in text.split("\n\n") {
        let block = raw.trim_matches('\n');
        if block.trim().is_empty() {
            continue;
        }
        parse_block(block, blocks);
    }
}

enum LineKind<'a> {
    Heading(u8, &'a str),
    UnorderedItem(&'a str),
    OrderedItem(&'a str),
    Quote(&'a str),
    Plain(&'a str),
}

fn classify(line: &str) -> LineKind<'_> {
    if let Some(rest) = line.strip_prefix("### ") {
        LineKind::Heading(3, rest)
    } else if let Some(rest) = line.strip_prefix("## ") {
        LineKind::Heading(2, rest)
    } else if let Some(rest) = line.strip_prefix("# ") {
        LineKind::Heading(1, rest)
    } else if let Some(rest) = line.strip_prefix("- ") {
        LineKind::UnorderedItem(rest)
    } else if let Some(rest) = ordered_item(line) {
        LineKind::OrderedItem(rest)
    } else if let Some(rest) = line.strip_prefix("> ") {
        LineKind::Quote(rest)
    } else {
        LineKind::Plain(line)
    }
}

/// `<digits>. ` prefix; the digits themselves are discarded and numbering
/// becomes positional.
fn ordered_item(line: &str) -> Option<&str> {
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    line[digits..].strip_prefix(". ")
}

fn parse_block(block: &str, blocks: &mut Vec<Block>) {
    let lines: Vec<LineKind> = block.lines().map(classify).collect();

    let has_items = lines
        .iter()
        .any(|l| matches!(l, LineKind::UnorderedItem(_) | LineKind::OrderedItem(_)));
    if has_items {
        blocks.push(parse_list_block(&lines));
        return;
    }

    // Headings and quotes stand alone; runs of plain lines join into one
    // paragraph whose interior newlines become line breaks.
    let mut paragraph: Vec<Vec<Inline>> = Vec::new();
    for line in &lines {
        match line {
            LineKind::Heading(level, rest) => {
                flush_paragraph(&mut paragraph, blocks);
                blocks.push(Block::Heading {
                    level: *level,
                    inlines: parse_inlines(rest),
                });
            }
            LineKind::Quote(rest) => {
                flush_paragraph(&mut paragraph, blocks);
                blocks.push(Block::Blockquote(parse_inlines(rest)));
            }
            LineKind::Plain(text) => paragraph.push(parse_inlines(text)),
            // excluded by the has_items check above
            LineKind::UnorderedItem(_) | LineKind::OrderedItem(_) => {}
        }
    }
    flush_paragraph(&mut paragraph, blocks);
}

fn flush_paragraph(paragraph: &mut Vec<Vec<Inline>>, blocks: &mut Vec<Block>) {
    if !paragraph.is_empty() {
        blocks.push(Block::Paragraph(std::mem::take(paragraph)));
    }
}

/// A block containing any list item becomes one single list container.
/// Stray non-item lines fold into the adjacent item.
fn parse_list_block(lines: &[LineKind]) -> Block {
    let ordered = lines
        .iter()
        .find_map(|l| match l {
            LineKind::OrderedItem(_) => Some(true),
            LineKind::UnorderedItem(_) => Some(false),
            _ => None,
        })
        .unwrap_or(false);

    let mut items: Vec<Vec<Inline>> = Vec::new();
    for line in lines {
        match line {
            LineKind::UnorderedItem(rest) | LineKind::OrderedItem(rest) => {
                items.push(parse_inlines(rest));
            }
            LineKind::Heading(_, rest) | LineKind::Quote(rest) | LineKind::Plain(rest) => {
                match items.last_mut() {
                    Some(item) => {
                        item.push(Inline::Text(" ".to_string()));
                        item.extend(parse_inlines(rest));
                    }
                    None => items.push(parse_inlines(rest)),
                }
            }
        }
    }

    Block::List { ordered, items }
}

/// Inline scanner. Bold is matched before italic so `**x**` consumes its
/// asterisks before the italic rule can misfire on them; unterminated
/// markers stay literal.
pub fn parse_inlines(text: &str) -> Vec<Inline> {
    let mut inlines = Vec::new();
    let mut literal = String::new();
    let mut i = 0;

    while i < text.len() {
        let rest = &text[i..];

        if let Some(inner) = delimited(rest, "**") {
            if !inner.is_empty() {
                flush_literal(&mut literal, &mut inlines);
                inlines.push(Inline::Strong(parse_inlines(inner)));
                i += inner.len() + 4;
                continue;
            }
        }
        if rest.starts_with("**") {
            literal.push_str("**");
            i += 2;
            continue;
        }

        if let Some(inner) = delimited(rest, "*") {
            if !inner.is_empty() {
                flush_literal(&mut literal, &mut inlines);
                inlines.push(Inline::Emph(parse_inlines(inner)));
                i += inner.len() + 2;
                continue;
            }
        }

        if let Some(inner) = delimited(rest, "`") {
            if !inner.is_empty() {
                flush_literal(&mut literal, &mut inlines);
                inlines.push(Inline::Code(inner.to_string()));
                i += inner.len() + 2;
                continue;
            }
        }

        if rest.starts_with('[') {
            if let Some((label, url, consumed)) = parse_link(rest) {
                flush_literal(&mut literal, &mut inlines);
                inlines.push(Inline::Link {
                    label: parse_inlines(label),
                    url: url.to_string(),
                });
                i += consumed;
                continue;
            }
        }

        match rest.chars().next() {
            Some(ch) => {
                literal.push(ch);
                i += ch.len_utf8();
            }
            None => break,
        }
    }

    flush_literal(&mut literal, &mut inlines);
    inlines
}

/// Non-greedy span: `text` starts with `marker` and the same marker closes
/// it somewhere ahead. Returns the inner slice.
fn delimited<'a>(text: &'a str, marker: &str) -> Option<&'a str> {
    let rest = text.strip_prefix(marker)?;
    let end = rest.find(marker)?;
    Some(&rest[..end])
}

/// `[label](url)`, with the label up to the first `]` and the url up to the
/// first `)`.
fn parse_link(text: &str) -> Option<(&str, &str, usize)> {
    let close = text.find(']')?;
    let rest = &text[close + 1..];
    let inner = rest.strip_prefix('(')?;
    let url_end = inner.find(')')?;
    Some((&text[1..close], &inner[..url_end], close + 1 + url_end + 2))
}

fn flush_literal(literal: &mut String, inlines: &mut Vec<Inline>) {
    if !literal.is_empty() {
        inlines.push(Inline::Text(std::mem::take(literal)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_levels_parse_at_line_start() {
        let blocks = parse("# One\n\n## Two\n\n### Three");
        assert_eq!(blocks.len(), 3);
        assert!(matches!(blocks[0], Block::Heading { level: 1, .. }));
        assert!(matches!(blocks[1], Block::Heading { level: 2, .. }));
        assert!(matches!(blocks[2], Block::Heading { level: 3, .. }));
    }

    #[test]
    fn heading_followed_by_same_block_text_splits() {
        let blocks = parse("# Title\nBody");
        assert_eq!(blocks.len(), 2);
        assert!(matches!(blocks[0], Block::Heading { level: 1, .. }));
        assert!(matches!(blocks[1], Block::Paragraph(_)));
    }

    #[test]
    fn bold_is_consumed_before_italic_can_misfire() {
        let inlines = parse_inlines("**x**");
        assert_eq!(inlines, vec![Inline::Strong(vec![Inline::text("x")])]);
    }

    #[test]
    fn italic_nests_inside_bold() {
        let inlines = parse_inlines("**a *b* c**");
        assert_eq!(
            inlines,
            vec![Inline::Strong(vec![
                Inline::text("a "),
                Inline::Emph(vec![Inline::text("b")]),
                Inline::text(" c"),
            ])]
        );
    }

    #[test]
    fn unterminated_markers_stay_literal() {
        assert_eq!(parse_inlines("**x*"), vec![Inline::text("**x*")]);
        assert_eq!(parse_inlines("`code"), vec![Inline::text("`code")]);
        assert_eq!(parse_inlines("a * b"), vec![Inline::text("a * b")]);
    }

    #[test]
    fn inline_code_contents_are_literal() {
        let inlines = parse_inlines("`**not bold**`");
        assert_eq!(inlines, vec![Inline::Code("**not bold**".to_string())]);
    }

    #[test]
    fn links_parse_label_and_url() {
        let inlines = parse_inlines("see [the docs](https://example.com) now");
        assert_eq!(
            inlines,
            vec![
                Inline::text("see "),
                Inline::Link {
                    label: vec![Inline::text("the docs")],
                    url: "https://example.com".to_string(),
                },
                Inline::text(" now"),
            ]
        );
    }

    #[test]
    fn bare_bracket_without_url_is_literal() {
        assert_eq!(parse_inlines("[not a link]"), vec![Inline::text("[not a link]")]);
    }

    #[test]
    fn unordered_block_becomes_one_list() {
        let blocks = parse("- a\n- b\n- c");
        match &blocks[..] {
            [Block::List { ordered, items }] => {
                assert!(!*ordered);
                assert_eq!(items.len(), 3);
            }
            other => panic!("expected one list, got {other:?}"),
        }
    }

    #[test]
    fn ordered_items_discard_their_digits() {
        let blocks = parse("1. first\n7. second");
        match &blocks[..] {
            [Block::List { ordered, items }] => {
                assert!(*ordered);
                assert_eq!(items[0], vec![Inline::text("first")]);
                assert_eq!(items[1], vec![Inline::text("second")]);
            }
            other => panic!("expected one list, got {other:?}"),
        }
    }

    #[test]
    fn stray_line_folds_into_the_adjacent_item() {
        let blocks = parse("- a\ncontinued");
        match &blocks[..] {
            [Block::List { items, .. }] => {
                assert_eq!(items.len(), 1);
                assert_eq!(
                    items[0],
                    vec![Inline::text("a"), Inline::text(" "), Inline::text("continued")]
                );
            }
            other => panic!("expected one list, got {other:?}"),
        }
    }

    #[test]
    fn quote_lines_each_form_a_blockquote() {
        let blocks = parse("> a\n> b");
        assert_eq!(blocks.len(), 2);
        assert!(matches!(blocks[0], Block::Blockquote(_)));
        assert!(matches!(blocks[1], Block::Blockquote(_)));
    }

    #[test]
    fn fenced_code_spans_blank_lines_and_keeps_its_language() {
        let blocks = parse("```rust\nfn main() {}\n\nfn other() {}\n```");
        match &blocks[..] {
            [Block::CodeBlock { lang, code }] => {
                assert_eq!(lang.as_deref(), Some("rust"));
                assert!(code.contains("fn main() {}\n\nfn other() {}"));
            }
            other => panic!("expected one code block, got {other:?}"),
        }
    }

    #[test]
    fn fence_without_language_line() {
        let blocks = parse("```\nplain\n```");
        match &blocks[..] {
            [Block::CodeBlock { lang, code }] => {
                assert_eq!(*lang, None);
                assert_eq!(code, "plain\n");
            }
            other => panic!("expected one code block, got {other:?}"),
        }
    }

    #[test]
    fn unclosed_fence_swallows_the_remaining_prefix() {
        // Mid-reveal state: the closing fence has not arrived yet.
        let blocks = parse("before\n\n```rust\nlet x = 1;");
        assert_eq!(blocks.len(), 2);
        assert!(matches!(blocks[0], Block::Paragraph(_)));
        match &blocks[1] {
            Block::CodeBlock { code, .. } => assert_eq!(code, "let x = 1;"),
            other => panic!("expected code block, got {other:?}"),
        }
    }

    #[test]
    fn code_inside_a_fence_is_not_inline_parsed() {
        let blocks = parse("```\n**bold** and [link](url)\n```");
        match &blocks[..] {
            [Block::CodeBlock { code, .. }] => {
                assert_eq!(code, "**bold** and [link](url)\n");
            }
            other => panic!("expected one code block, got {other:?}"),
        }
    }

    #[test]
    fn blank_blocks_produce_nothing() {
        assert!(parse("").is_empty());
        assert!(parse("\n\n\n\n").is_empty());
        assert!(parse("   \n\n  ").is_empty());
    }
}
