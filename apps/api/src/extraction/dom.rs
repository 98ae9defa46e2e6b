//! Narrow adapter over `dom_query`: parse HTML and read its text with line breaks
//! where block-level elements begin and end.

use dom_query::{Document, NodeRef, Selection};

/// Elements whose text never belongs in extracted output.
const SKIPPED_TAGS: &[&str] = &[
    "script", "style", "noscript", "template", "svg", "iframe", "head",
];

/// Elements rendered as their own paragraph.
const PARAGRAPH_TAGS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "article", "section", "main", "header",
    "footer", "aside", "nav", "blockquote", "pre", "ul", "ol", "dl", "table", "form",
    "figure", "hr",
];

/// Elements rendered on their own line.
const LINE_TAGS: &[&str] = &[
    "div", "li", "br", "tr", "dt", "dd", "td", "th", "caption", "figcaption", "address",
];

pub fn parse(html: &str) -> Document {
    Document::from(html)
}

/// Text under every node of `sel`, with `\n` around line-level elements and a
/// blank line around paragraph-level ones. The result is not normalized.
pub fn block_text(sel: &Selection) -> String {
    let mut out = String::new();
    for node in sel.nodes() {
        collect_text(node, &mut out);
    }
    out
}

/// Text of a whole document, `<head>` excluded.
pub fn document_text(doc: &Document) -> String {
    block_text(&doc.select("body"))
}

/// Text of an HTML fragment such as a JSON-LD `description` value.
pub fn fragment_text(html: &str) -> String {
    document_text(&parse(html))
}

fn collect_text(node: &NodeRef, out: &mut String) {
    for child in node.children() {
        if child.is_text() {
            out.push_str(&child.text());
            continue;
        }
        if !child.is_element() {
            continue;
        }

        let tag = child
            .node_name()
            .map(|name| name.to_ascii_lowercase())
            .unwrap_or_default();
        if SKIPPED_TAGS.contains(&tag.as_str()) {
            continue;
        }

        let breaks = if PARAGRAPH_TAGS.contains(&tag.as_str()) {
            2
        } else if LINE_TAGS.contains(&tag.as_str()) {
            1
        } else {
            0
        };

        ensure_breaks(out, breaks);
        collect_text(&child, out);
        ensure_breaks(out, breaks);
    }
}

/// Pads `out` so it ends with at least `count` newlines (never at the very start).
fn ensure_breaks(out: &mut String, count: usize) {
    if count == 0 || out.is_empty() {
        return;
    }
    let trailing = out.chars().rev().take_while(|c| *c == '\n').count();
    for _ in trailing..count {
        out.push('\n');
    }
}
