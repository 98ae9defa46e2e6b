//! Readability strategy: main-content extraction for article-like pages.

use dom_smoothie::Readability;
use tracing::debug;

use crate::extraction::dom;
use crate::extraction::{ExtractionResult, ExtractionSource};

/// Runs the readability heuristic with `base_url` as the document URL.
///
/// Returns `None` when no article is found, the text is empty, or the
/// document cannot be processed.
pub fn extract_readable(html: &str, base_url: &str) -> Option<ExtractionResult> {
    let document_url = (!base_url.is_empty()).then_some(base_url);

    let mut reader = match Readability::new(html, document_url, None) {
        Ok(reader) => reader,
        Err(e) => {
            debug!("Readability could not load document: {e:?}");
            return None;
        }
    };

    let article = match reader.parse() {
        Ok(article) => article,
        Err(e) => {
            debug!("Readability found no article: {e:?}");
            return None;
        }
    };

    // Re-render the cleaned article HTML so paragraphs keep their breaks;
    // the flat text content is the fallback.
    let content = dom::parse(&article.content);
    let text = dom::document_text(&content);
    ExtractionResult::from_raw(&text, ExtractionSource::Readability).or_else(|| {
        ExtractionResult::from_raw(&article.text_content, ExtractionSource::Readability)
    })
}
