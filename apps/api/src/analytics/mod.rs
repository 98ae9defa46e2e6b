// Best-effort product analytics: event capture and the cover letter counter
// behind /api/stats. Nothing here may fail a user-facing request.

pub mod handlers;
pub mod posthog;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

pub use posthog::PostHogCounter;

pub const COVER_LETTER_GENERATED: &str = "cover_letter_generated";
pub const COMPANY_RESEARCH_GENERATED: &str = "company_research_generated";

#[async_trait]
pub trait EventCounter: Send + Sync {
    /// Records one event. Failures are logged and swallowed.
    async fn record(&self, event: &str, properties: Value);

    /// Total occurrences of `event`, or 0 when unknown.
    async fn count(&self, event: &str) -> u64;
}

/// Fire-and-forget `record` on a background task.
pub fn record_in_background(events: Arc<dyn EventCounter>, event: &'static str, properties: Value) {
    tokio::spawn(async move {
        events.record(event, properties).await;
    });
}
