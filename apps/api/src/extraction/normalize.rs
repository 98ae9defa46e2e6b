//! Whitespace normalization and repeated header/footer removal for extracted text.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

/// Documents shorter than this are left alone by `strip_repeated_boilerplate`.
const MIN_LINES_FOR_BOILERPLATE: usize = 10;
/// A first/last line repeated at least this often is treated as a page header/footer.
const BOILERPLATE_REPEATS: usize = 3;

static TABS_AND_CRS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\t\r]+").expect("TABS_AND_CRS regex"));

static SPACE_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" +").expect("SPACE_RUNS regex"));

/// Any whitespace run containing two or more newlines.
static BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\n\s*\n\s*").expect("BLANK_LINES regex"));

static EXCESS_NEWLINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("EXCESS_NEWLINES regex"));

/// Normalizes whitespace in extracted text.
///
/// - non-breaking spaces become spaces
/// - tabs and carriage returns become a single space, space runs collapse
/// - any whitespace run holding two or more newlines becomes exactly `\n\n`
/// - leading/trailing whitespace is trimmed
///
/// Total and idempotent; empty input yields an empty string.
pub fn normalize(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let text = raw.replace('\u{00A0}', " ");
    let text = TABS_AND_CRS.replace_all(&text, " ");
    let text = SPACE_RUNS.replace_all(&text, " ");
    let text = BLANK_LINES.replace_all(&text, "\n\n");
    text.trim().to_string()
}

/// Collapses three or more consecutive newlines into a single blank line.
pub fn collapse_excess_newlines(text: &str) -> String {
    EXCESS_NEWLINES.replace_all(text, "\n\n").into_owned()
}

/// Removes page headers and footers repeated throughout a multi-page document.
///
/// When the document has at least ten lines, every occurrence of the first line
/// is deleted if that line appears three or more times, and likewise for the last
/// line. Both checks use the counts of the original text.
pub fn strip_repeated_boilerplate(text: &str) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    if lines.len() < MIN_LINES_FOR_BOILERPLATE {
        return text.to_string();
    }

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for line in &lines {
        *counts.entry(*line).or_default() += 1;
    }

    let is_repeated = |line: &str| {
        !line.is_empty() && counts.get(line).copied().unwrap_or(0) >= BOILERPLATE_REPEATS
    };

    let header = lines[0];
    let footer = lines[lines.len() - 1];
    let drop_header = is_repeated(header);
    let drop_footer = is_repeated(footer);

    if !drop_header && !drop_footer {
        return text.to_string();
    }

    lines
        .into_iter()
        .filter(|line| !(drop_header && *line == header) && !(drop_footer && *line == footer))
        .collect::<Vec<_>>()
        .join("\n")
}
