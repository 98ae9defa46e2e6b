use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::llm_client::LlmHealth;
use crate::state::AppState;

/// GET /health
/// Returns a simple status object with service version.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "jobkit-api"
    }))
}

/// GET /api/health/llm
/// Probes the completion provider's credentials. Always 200; the body says
/// what is wrong.
pub async fn llm_health_handler(State(state): State<AppState>) -> Json<LlmHealth> {
    Json(state.llm.check_health().await)
}
