// Résumé upload: validate the file, then pull plain text out of PDF/DOCX.

pub mod extractor;
pub mod handlers;
pub mod upload;

pub use extractor::{DocumentTextExtractor, FileTextExtractor};
