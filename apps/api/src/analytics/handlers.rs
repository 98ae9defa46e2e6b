use axum::{extract::State, Json};
use serde::Serialize;

use crate::analytics::COVER_LETTER_GENERATED;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total: u64,
    pub env: String,
}

/// GET /api/stats
///
/// Number of cover letters generated so far. Falls back to 0 when analytics
/// is unconfigured or unreachable.
pub async fn handle_stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let total = state.events.count(COVER_LETTER_GENERATED).await;
    Json(StatsResponse {
        total,
        env: state.config.app_env.clone(),
    })
}
