//! Axum route handler for company research.

use std::time::Duration;

use axum::{extract::State, Json};
use serde_json::json;
use tracing::{info, warn};

use crate::analytics::{record_in_background, COMPANY_RESEARCH_GENERATED};
use crate::company_research::prompts::{build_company_research_prompt, COMPANY_RESEARCH_SYSTEM};
use crate::company_research::report::{extract_json_and_markdown, validate_research_json};
use crate::company_research::types::{CompanyResearchRequest, CompanyResearchResponse};
use crate::cover_letter::handlers::MAX_INPUT_CHARS;
use crate::errors::AppError;
use crate::state::AppState;

const MODEL_TIMEOUT: Duration = Duration::from_secs(20);
/// The report plus its JSON object runs far past a cover letter.
const MAX_OUTPUT_TOKENS: u32 = 2_500;

/// POST /api/company-research
///
/// Returns the model's markdown report and its schema-checked JSON.
pub async fn handle_company_research(
    State(state): State<AppState>,
    Json(request): Json<CompanyResearchRequest>,
) -> Result<Json<CompanyResearchResponse>, AppError> {
    if request.company.trim().is_empty() {
        return Err(AppError::Validation("Company is required.".to_string()));
    }
    let free_text = [&request.role_details.jd_text, &request.company_hints.notes];
    if free_text
        .iter()
        .filter_map(|text| text.as_deref())
        .any(|text| text.chars().count() > MAX_INPUT_CHARS)
    {
        return Err(AppError::PayloadTooLarge(
            "Input too long (max 10k chars per field).".to_string(),
        ));
    }

    let today = chrono::Utc::now().format("%Y-%m-%d").to_string();
    let prompt = build_company_research_prompt(&request, &today);
    let completion = state
        .llm
        .complete(COMPANY_RESEARCH_SYSTEM, &prompt, MAX_OUTPUT_TOKENS);
    let raw = tokio::time::timeout(MODEL_TIMEOUT, completion)
        .await
        .map_err(|_| AppError::UpstreamTimeout("Provider timeout".to_string()))??;

    if raw.trim().is_empty() {
        return Err(AppError::BadGateway("Empty model response".to_string()));
    }

    let report = extract_json_and_markdown(&raw)
        .and_then(|(json, markdown)| Ok((validate_research_json(json)?, markdown)));
    let (json, markdown) = match report {
        Ok(parts) => parts,
        Err(e) => {
            warn!(company = %request.company, "Rejected company research output: {e}");
            return Err(AppError::BadGateway(
                "Model returned an invalid research report".to_string(),
            ));
        }
    };

    info!(company = %json.company, chars = markdown.len(), "Generated company research");
    record_in_background(
        state.events.clone(),
        COMPANY_RESEARCH_GENERATED,
        json!({ "company": json.company }),
    );

    Ok(Json(CompanyResearchResponse { markdown, json }))
}
