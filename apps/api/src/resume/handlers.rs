//! Axum route handler for résumé uploads.

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use crate::errors::AppError;
use crate::resume::extractor::{DocumentError, ExtractedDocument};
use crate::resume::upload::{validate_upload, UploadError, UploadedDocument, MAX_UPLOAD_BYTES};
use crate::state::AppState;

/// Body limit for the upload route: the file ceiling plus room for multipart framing.
pub fn upload_body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(MAX_UPLOAD_BYTES + 64 * 1024)
}

impl From<UploadError> for AppError {
    fn from(e: UploadError) -> Self {
        match e {
            UploadError::Unsupported => AppError::UnsupportedMediaType(e.to_string()),
            UploadError::TooLarge => AppError::PayloadTooLarge(e.to_string()),
            UploadError::Missing => AppError::Validation(e.to_string()),
        }
    }
}

/// Pulls the `file` field out of the form and validates it.
async fn read_upload(multipart: &mut Multipart) -> Result<UploadedDocument, AppError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(multipart_error)?;

        let kind = validate_upload(&file_name, &content_type, bytes.len())?;
        return Ok(UploadedDocument {
            file_name,
            kind,
            bytes,
        });
    }
    Err(UploadError::Missing.into())
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        UploadError::TooLarge.into()
    } else {
        AppError::Validation(format!("Invalid upload: {e}"))
    }
}

/// POST /api/resume/extract
///
/// Multipart upload with a single `file` field (PDF or DOCX, max 5 MB).
pub async fn handle_extract_resume(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ExtractedDocument>, AppError> {
    let upload = read_upload(&mut multipart).await?;
    let content_type = upload.kind.mime();

    // CPU-bound decode, run on the blocking pool.
    let documents = state.documents.clone();
    let file_name = upload.file_name.clone();
    let document = tokio::task::spawn_blocking(move || {
        documents.extract(&upload.bytes, &upload.file_name, content_type)
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in résumé extraction: {e}")))?
    .map_err(|e| match e {
        DocumentError::Unsupported => AppError::UnsupportedMediaType(e.to_string()),
    })?;

    info!(
        file = %file_name,
        chars = document.meta.chars,
        warnings = document.warnings.len(),
        "Extracted résumé text"
    );
    Ok(Json(document))
}
