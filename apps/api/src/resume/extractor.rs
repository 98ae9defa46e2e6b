//! Résumé text extraction for PDF and DOCX uploads.
//!
//! Decoder failures never surface as errors: a file we cannot read yields
//! empty text (plus the OCR warning for PDFs) so the UI can ask the user to
//! paste their résumé instead.

use std::io::{Cursor, Read};
use std::panic::{catch_unwind, AssertUnwindSafe};

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::extraction::normalize::{collapse_excess_newlines, normalize, strip_repeated_boilerplate};
use crate::resume::upload::DocumentKind;

pub const OCR_WARNING: &str = "We couldn’t read this file because it’s a scanned PDF. \
    OCR isn’t supported yet. Please paste your resume text instead.";

const DOCX_BODY: &str = "word/document.xml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocumentMeta {
    pub chars: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractedDocument {
    pub text: String,
    pub warnings: Vec<String>,
    pub meta: DocumentMeta,
}

impl ExtractedDocument {
    fn new(text: String, warnings: Vec<String>) -> Self {
        let chars = text.chars().count();
        Self {
            text,
            warnings,
            meta: DocumentMeta { chars },
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocumentError {
    #[error("Unsupported file type")]
    Unsupported,
}

/// Turns an uploaded document into plain text. Synchronous and CPU-bound;
/// callers run it on the blocking pool.
pub trait DocumentTextExtractor: Send + Sync {
    fn extract(
        &self,
        bytes: &[u8],
        file_name: &str,
        content_type: &str,
    ) -> Result<ExtractedDocument, DocumentError>;
}

/// `pdf-extract` for PDFs, the DOCX zip container read directly.
pub struct FileTextExtractor;

impl DocumentTextExtractor for FileTextExtractor {
    fn extract(
        &self,
        bytes: &[u8],
        file_name: &str,
        content_type: &str,
    ) -> Result<ExtractedDocument, DocumentError> {
        match DocumentKind::detect(file_name, content_type) {
            Some(DocumentKind::Pdf) => Ok(extract_pdf(bytes)),
            Some(DocumentKind::Docx) => Ok(extract_docx(bytes)),
            None => Err(DocumentError::Unsupported),
        }
    }
}

pub fn extract_pdf(bytes: &[u8]) -> ExtractedDocument {
    // pdf-extract panics on some malformed inputs.
    let raw = match catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(bytes))) {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => {
            debug!("PDF text extraction failed: {e}");
            String::new()
        }
        Err(_) => {
            debug!("PDF text extraction panicked");
            String::new()
        }
    };

    let text = collapse_excess_newlines(&normalize(&strip_repeated_boilerplate(&raw)));
    let warnings = if text.is_empty() {
        vec![OCR_WARNING.to_string()]
    } else {
        Vec::new()
    };
    ExtractedDocument::new(text, warnings)
}

pub fn extract_docx(bytes: &[u8]) -> ExtractedDocument {
    let raw = read_docx_body(bytes)
        .map(|xml| docx_xml_text(&xml))
        .unwrap_or_default();
    ExtractedDocument::new(collapse_excess_newlines(&normalize(&raw)), Vec::new())
}

fn read_docx_body(bytes: &[u8]) -> Option<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| debug!("DOCX is not a zip archive: {e}"))
        .ok()?;
    let mut entry = archive.by_name(DOCX_BODY).ok()?;
    let mut xml = String::new();
    entry.read_to_string(&mut xml).ok()?;
    Some(xml)
}

/// Collects the visible text of a WordprocessingML body: `w:t` runs, tabs,
/// explicit breaks, and a blank line after each paragraph.
fn docx_xml_text(xml: &str) -> String {
    let mut reader = Reader::from_str(xml);
    let mut out = String::new();
    let mut in_text = false;
    // Tab stop definitions (`w:tabs/w:tab`) are layout, not content.
    let mut in_tab_stops = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"w:t" => in_text = true,
                b"w:tabs" => in_tab_stops = true,
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"w:tab" if !in_tab_stops => out.push('\t'),
                b"w:br" | b"w:cr" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Text(e)) if in_text => {
                if let Ok(text) = e.unescape() {
                    out.push_str(&text);
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:tabs" => in_tab_stops = false,
                b"w:p" => out.push_str("\n\n"),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                debug!("DOCX body is not well-formed XML: {e}");
                break;
            }
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn docx_with_body(body: &str) -> Vec<u8> {
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
        );
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer.start_file(DOCX_BODY, SimpleFileOptions::default()).unwrap();
        writer.write_all(xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_docx_paragraphs_and_runs() {
        let bytes = docx_with_body(
            r#"<w:p><w:pPr><w:tabs><w:tab w:val="left" w:pos="720"/></w:tabs></w:pPr>
               <w:r><w:t>Jane</w:t></w:r><w:r><w:t xml:space="preserve"> Doe</w:t></w:r></w:p>
               <w:p><w:r><w:t>Skills:</w:t><w:tab/><w:t>Rust &amp; Go</w:t><w:br/><w:t>SQL</w:t></w:r></w:p>"#,
        );
        let doc = extract_docx(&bytes);
        assert_eq!(doc.text, "Jane Doe\n\nSkills: Rust & Go\nSQL");
        assert!(doc.warnings.is_empty());
        assert_eq!(doc.meta.chars, doc.text.chars().count());
    }

    #[test]
    fn test_corrupt_docx_yields_empty_text() {
        let doc = extract_docx(b"PK\x03\x04 definitely not a real archive");
        assert!(doc.text.is_empty());
        assert!(doc.warnings.is_empty());
    }

    #[test]
    fn test_unreadable_pdf_carries_ocr_warning() {
        let doc = extract_pdf(b"%PDF-1.4\n%%EOF garbage");
        assert!(doc.text.is_empty());
        assert_eq!(doc.warnings, vec![OCR_WARNING.to_string()]);
        assert_eq!(doc.meta.chars, 0);
    }

    #[test]
    fn test_ocr_warning_uses_typographic_apostrophes() {
        assert!(OCR_WARNING.starts_with("We couldn\u{2019}t read this file"));
        assert!(!OCR_WARNING.contains('\''));
    }

    #[test]
    fn test_dispatch_by_kind() {
        let extractor = FileTextExtractor;
        let docx = docx_with_body("<w:p><w:r><w:t>Hello</w:t></w:r></w:p>");
        let doc = extractor.extract(&docx, "cv.docx", "").unwrap();
        assert_eq!(doc.text, "Hello");
        assert_eq!(
            extractor.extract(b"plain", "cv.txt", "text/plain"),
            Err(DocumentError::Unsupported)
        );
    }
}
