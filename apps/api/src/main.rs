mod analytics;
mod company_research;
mod config;
mod cover_letter;
mod errors;
mod extraction;
mod fetch;
mod llm_client;
mod resume;
mod routes;
mod state;
#[cfg(test)]
mod test_support;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analytics::PostHogCounter;
use crate::config::Config;
use crate::fetch::FetchGuard;
use crate::llm_client::LlmClient;
use crate::resume::FileTextExtractor;
use crate::routes::{build_router, cors_layer};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting JobKit API v{} ({})", env!("CARGO_PKG_VERSION"), config.app_env);

    // Fetch guard for JD import
    let fetch_guard = FetchGuard::new(config.fetch.clone())?;
    info!(
        "Fetch guard initialized (timeout: {:?}, max bytes: {})",
        config.fetch.timeout, config.fetch.max_bytes
    );

    // Initialize LLM client
    let llm = LlmClient::new(
        config.openai_api_key.clone(),
        config.openai_model.clone(),
        config.openai_base_url.clone(),
    )?;
    info!("LLM client initialized (model: {})", llm.model());

    let events = PostHogCounter::new(config.posthog.clone())?;

    // Build app state
    let state = AppState {
        config: config.clone(),
        fetch_guard: Arc::new(fetch_guard),
        llm: Arc::new(llm),
        documents: Arc::new(FileTextExtractor),
        events: Arc::new(events),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config));

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
