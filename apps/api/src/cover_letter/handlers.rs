//! Axum route handler for cover letter generation.

use std::time::Duration;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::analytics::{record_in_background, COVER_LETTER_GENERATED};
use crate::cover_letter::paragraphs::ensure_three_paragraphs;
use crate::cover_letter::prompts::{build_cover_letter_prompt, COVER_LETTER_SYSTEM};
use crate::errors::AppError;
use crate::llm_client::DEFAULT_MAX_OUTPUT_TOKENS;
use crate::state::AppState;

/// Max characters accepted for each of `resume` and `jd`.
pub const MAX_INPUT_CHARS: usize = 10_000;
const MODEL_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Deserialize)]
pub struct CoverLetterRequest {
    #[serde(default)]
    pub resume: String,
    #[serde(default)]
    pub jd: String,
}

#[derive(Debug, Serialize)]
pub struct CoverLetterResponse {
    pub letter: String,
}

/// POST /api/cover-letter/generate
pub async fn handle_generate_cover_letter(
    State(state): State<AppState>,
    Json(request): Json<CoverLetterRequest>,
) -> Result<Json<CoverLetterResponse>, AppError> {
    if request.resume.trim().is_empty() || request.jd.trim().is_empty() {
        return Err(AppError::Validation(
            "Both resume and jd are required.".to_string(),
        ));
    }
    if request.resume.chars().count() > MAX_INPUT_CHARS || request.jd.chars().count() > MAX_INPUT_CHARS
    {
        return Err(AppError::PayloadTooLarge(
            "Input too long (max 10k chars each).".to_string(),
        ));
    }

    let prompt = build_cover_letter_prompt(&request.resume, &request.jd);
    let completion = state
        .llm
        .complete(COVER_LETTER_SYSTEM, &prompt, DEFAULT_MAX_OUTPUT_TOKENS);
    let raw = tokio::time::timeout(MODEL_TIMEOUT, completion)
        .await
        .map_err(|_| AppError::UpstreamTimeout("Provider timeout".to_string()))??;

    let letter = ensure_three_paragraphs(&raw);
    if letter.is_empty() {
        return Err(AppError::BadGateway("Empty model response".to_string()));
    }

    info!(chars = letter.len(), "Generated cover letter");
    record_in_background(
        state.events.clone(),
        COVER_LETTER_GENERATED,
        json!({ "letter_chars": letter.chars().count() }),
    );

    Ok(Json(CoverLetterResponse { letter }))
}
