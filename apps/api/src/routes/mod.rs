pub mod health;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::analytics::handlers::handle_stats;
use crate::company_research::handlers::handle_company_research;
use crate::config::Config;
use crate::cover_letter::handlers::handle_generate_cover_letter;
use crate::fetch::handlers::handle_jd_from_url;
use crate::resume::handlers::{handle_extract_resume, upload_body_limit};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/health/llm", get(health::llm_health_handler))
        // JD import; the SPA calls the /api path
        .route("/jd-from-url", post(handle_jd_from_url))
        .route("/api/jd-from-url", post(handle_jd_from_url))
        // Cover letters
        .route(
            "/api/cover-letter/generate",
            post(handle_generate_cover_letter),
        )
        .route("/api/company-research", post(handle_company_research))
        .route(
            "/api/resume/extract",
            post(handle_extract_resume).layer(upload_body_limit()),
        )
        .route(
            "/api/extract-resume",
            post(handle_extract_resume).layer(upload_body_limit()),
        )
        .route("/api/stats", get(handle_stats))
        .with_state(state)
}

/// Any origin in development; only `ALLOWED_ORIGIN` entries in production.
/// Disallowed origins get no CORS headers, so browsers block the response.
pub fn cors_layer(config: &Config) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    if !config.is_production() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}
