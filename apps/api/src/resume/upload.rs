use bytes::Bytes;
use thiserror::Error;

/// Largest résumé upload accepted, in bytes.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
}

impl DocumentKind {
    /// Detects the kind from the file name extension or the declared MIME type.
    pub fn detect(file_name: &str, content_type: &str) -> Option<Self> {
        let name = file_name.to_ascii_lowercase();
        let mime = content_type.to_ascii_lowercase();
        if name.ends_with(".pdf") || mime.contains("application/pdf") {
            Some(DocumentKind::Pdf)
        } else if name.ends_with(".docx") || mime.contains(DOCX_MIME) {
            Some(DocumentKind::Docx)
        } else {
            None
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            DocumentKind::Pdf => "application/pdf",
            DocumentKind::Docx => DOCX_MIME,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UploadError {
    #[error("Unsupported file type. Only PDF and DOCX are allowed.")]
    Unsupported,

    #[error("File too large (max 5 MB).")]
    TooLarge,

    #[error("No file uploaded. Send the résumé in a 'file' field.")]
    Missing,
}

/// A validated upload, ready for text extraction.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub file_name: String,
    pub kind: DocumentKind,
    pub bytes: Bytes,
}

/// Checks type and size before any parsing happens.
pub fn validate_upload(
    file_name: &str,
    content_type: &str,
    size: usize,
) -> Result<DocumentKind, UploadError> {
    let kind = DocumentKind::detect(file_name, content_type).ok_or(UploadError::Unsupported)?;
    if size > MAX_UPLOAD_BYTES {
        return Err(UploadError::TooLarge);
    }
    Ok(kind)
}
