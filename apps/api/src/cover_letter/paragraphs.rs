use std::sync::LazyLock;

use regex::Regex;

static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{2,}").expect("valid paragraph regex"));

/// Reshapes model output into exactly three paragraphs when possible.
///
/// Output that already has three paragraphs is kept (trimmed). Anything else
/// is flattened and its words split into three near-equal paragraphs; fewer
/// than three words yield fewer paragraphs.
pub fn ensure_three_paragraphs(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let paragraphs: Vec<&str> = PARAGRAPH_BREAK
        .split(trimmed)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    if paragraphs.len() == 3 {
        return paragraphs.join("\n\n");
    }

    let words: Vec<&str> = trimmed.split_whitespace().collect();
    let per = words.len().div_ceil(3);
    words
        .chunks(per)
        .map(|chunk| chunk.join(" "))
        .collect::<Vec<_>>()
        .join("\n\n")
}
