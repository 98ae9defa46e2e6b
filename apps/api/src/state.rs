use std::sync::Arc;

use crate::analytics::EventCounter;
use crate::config::Config;
use crate::fetch::FetchGuard;
use crate::llm_client::TextCompletion;
use crate::resume::DocumentTextExtractor;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub fetch_guard: Arc<FetchGuard>,
    /// Text completion service. Default: OpenAI Responses API client.
    pub llm: Arc<dyn TextCompletion>,
    /// PDF/DOCX text extraction for résumé uploads.
    pub documents: Arc<dyn DocumentTextExtractor>,
    pub events: Arc<dyn EventCounter>,
}
