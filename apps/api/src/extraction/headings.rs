//! Heading-heuristics strategy, the last resort for pages without semantic structure.

use crate::extraction::dom;
use crate::extraction::normalize::normalize;
use crate::extraction::{ExtractionResult, ExtractionSource};

const HEADING_SELECTOR: &str = "h1, h2, h3, h4, strong, b";

/// Lower-case substrings that mark a job-section heading.
const SECTION_KEYWORDS: &[&str] = &[
    "responsibilities",
    "requirements",
    "qualifications",
    "what you'll do",
    "what you will do",
    "minimum",
    "preferred",
];

/// Collects the container of every job-section heading (in document order),
/// followed by the whole-page text.
///
/// Only returns `None` when the page has no text at all.
pub fn extract_by_headings(html: &str) -> Option<ExtractionResult> {
    let doc = dom::parse(html);
    let baseline = normalize(&dom::document_text(&doc));

    let mut blocks: Vec<String> = doc
        .select(HEADING_SELECTOR)
        .iter()
        .filter(|heading| is_section_heading(&heading.text()))
        .map(|heading| normalize(&dom::block_text(&heading.parent())))
        .filter(|snippet| !snippet.is_empty())
        .collect();
    blocks.push(baseline);

    ExtractionResult::from_raw(&blocks.join("\n\n"), ExtractionSource::Heuristic)
}

fn is_section_heading(label: &str) -> bool {
    let label = label.trim().to_lowercase().replace('\u{2019}', "'");
    SECTION_KEYWORDS.iter().any(|keyword| label.contains(keyword))
}
