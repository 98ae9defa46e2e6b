//! Axum route handler for importing a job description by URL.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::extraction::ExtractionSource;
use crate::fetch::FetchError;
use crate::state::AppState;

pub const HEURISTIC_WARNING: &str =
    "Extracted with page heuristics; review for unrelated page text.";

#[derive(Debug, Deserialize)]
pub struct JdFromUrlRequest {
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct JdFromUrlResponse {
    pub text: String,
    pub source: ExtractionSource,
    /// Host of the final URL, after redirects.
    pub host: String,
    pub warnings: Vec<String>,
}

/// POST /jd-from-url
///
/// Fetches the posting through the fetch guard and returns the extracted text.
pub async fn handle_jd_from_url(
    State(state): State<AppState>,
    Json(request): Json<JdFromUrlRequest>,
) -> Result<Json<JdFromUrlResponse>, AppError> {
    if request.url.trim().is_empty() {
        return Err(FetchError::InvalidUrl.into());
    }

    let fetched = state.fetch_guard.fetch_jd_from_url(&request.url).await?;

    let mut warnings = Vec::new();
    if fetched.extraction.source == ExtractionSource::Heuristic {
        warnings.push(HEURISTIC_WARNING.to_string());
    }

    Ok(Json(JdFromUrlResponse {
        host: fetched.final_url.host_str().unwrap_or_default().to_string(),
        text: fetched.extraction.text,
        source: fetched.extraction.source,
        warnings,
    }))
}
