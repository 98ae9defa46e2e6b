//! JD extraction pipeline: an ordered fallback over the three strategies.
//!
//! 1. structured data (`JobPosting` JSON-LD): authoritative when present
//! 2. readability: general-purpose main-content extraction
//! 3. heading heuristics: least reliable, last resort
//!
//! Strategies are evaluated lazily; the first non-empty result wins.

use tracing::debug;

use crate::extraction::headings::extract_by_headings;
use crate::extraction::readability::extract_readable;
use crate::extraction::structured::extract_structured;
use crate::extraction::{ExtractionResult, ExtractionSource};

/// Common strategy signature: `(html, base_url) -> result`.
pub type Strategy = fn(&str, &str) -> Option<ExtractionResult>;

/// Whole-pipeline signature, as held by the fetch guard.
pub type JdExtractor = fn(&str, &str) -> ExtractionResult;

/// Named strategies in the order they are tried.
pub const STRATEGIES: [(&str, Strategy); 3] = [
    ("structured", structured),
    ("readability", extract_readable),
    ("heuristic", heuristic),
];

fn structured(html: &str, _base_url: &str) -> Option<ExtractionResult> {
    extract_structured(html)
}

fn heuristic(html: &str, _base_url: &str) -> Option<ExtractionResult> {
    extract_by_headings(html)
}

/// Extracts job-description text from `html` fetched from `url`.
///
/// Never fails: when every strategy comes up empty the result is empty text
/// attributed to the heuristic strategy.
pub fn extract_jd(html: &str, url: &str) -> ExtractionResult {
    extract_with(&STRATEGIES, html, url)
}

/// Runs `strategies` in order and returns the first non-empty result.
pub fn extract_with(strategies: &[(&str, Strategy)], html: &str, url: &str) -> ExtractionResult {
    for &(name, strategy) in strategies {
        match strategy(html, url) {
            Some(result) if !result.text.is_empty() => {
                debug!(strategy = name, chars = result.text.len(), "JD strategy matched");
                return result;
            }
            _ => debug!(strategy = name, "JD strategy found nothing"),
        }
    }

    ExtractionResult {
        text: String::new(),
        source: ExtractionSource::Heuristic,
    }
}
