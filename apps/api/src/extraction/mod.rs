// Job-description extraction from untrusted HTML.
// Strategies run in a fixed order (structured data → readability → heading
// heuristics); parse failures inside a strategy mean "found nothing".

pub mod dom;
pub mod headings;
pub mod normalize;
pub mod pipeline;
pub mod readability;
pub mod structured;

use serde::{Deserialize, Serialize};

pub use pipeline::{extract_jd, JdExtractor};

/// Which strategy produced an extraction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtractionSource {
    #[serde(rename = "jsonld")]
    Structured,
    #[serde(rename = "readability")]
    Readability,
    #[serde(rename = "heuristics")]
    Heuristic,
    /// No strategy ran; only seen on an empty default result.
    #[default]
    #[serde(rename = "none")]
    Empty,
}

/// Extracted job-description text and its provenance.
///
/// `text` is always whitespace-normalized; when it is non-empty `source` is
/// never `Empty`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionResult {
    pub text: String,
    pub source: ExtractionSource,
}

impl ExtractionResult {
    /// Normalizes `raw` and wraps it, or returns `None` when nothing is left.
    pub fn from_raw(raw: &str, source: ExtractionSource) -> Option<Self> {
        let text = normalize::normalize(raw);
        if text.is_empty() {
            return None;
        }
        Some(Self { text, source })
    }
}
