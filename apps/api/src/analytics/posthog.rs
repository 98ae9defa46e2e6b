//! PostHog-backed event counter.
//!
//! Capture goes to the ingestion host; counts come from a HogQL query against
//! the project API and are cached for a minute.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::analytics::EventCounter;
use crate::config::PostHogConfig;

const COUNT_CACHE_TTL: Duration = Duration::from_secs(60);

struct CachedCount {
    event: String,
    fetched_at: Instant,
    total: u64,
}

pub struct PostHogCounter {
    client: Client,
    config: PostHogConfig,
    cache: Mutex<Option<CachedCount>>,
}

impl PostHogCounter {
    pub fn new(config: PostHogConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self {
            client,
            config,
            cache: Mutex::new(None),
        })
    }

    async fn query_count(&self, event: &str) -> Result<u64, String> {
        let url = format!(
            "{}/api/projects/{}/query/",
            self.config.api_host.trim_end_matches('/'),
            self.config.project_id
        );
        // Event names are our own constants, never user input.
        let payload = json!({
            "query": {
                "kind": "HogQLQuery",
                "query": format!("SELECT count() AS total FROM events WHERE event = '{event}'"),
            }
        });

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.config.personal_api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("query failed ({status}): {body}"));
        }

        let data: Value = response.json().await.map_err(|e| e.to_string())?;
        Ok(parse_total(&data))
    }
}

#[async_trait]
impl EventCounter for PostHogCounter {
    async fn record(&self, event: &str, properties: Value) {
        if self.config.project_key.is_empty() {
            return;
        }

        let distinct_id = format!("server-{}", &Uuid::new_v4().simple().to_string()[..8]);
        let mut properties = match properties {
            Value::Object(map) => Value::Object(map),
            _ => json!({}),
        };
        properties["distinct_id"] = json!(distinct_id);

        let body = json!({
            "api_key": self.config.project_key,
            "event": event,
            "properties": properties,
            "distinct_id": distinct_id,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });
        let url = format!("{}/capture/", self.config.ingestion_host.trim_end_matches('/'));

        match self.client.post(url).json(&body).send().await {
            Ok(r) if r.status().is_success() => debug!(event, "Captured analytics event"),
            Ok(r) => {
                let status = r.status();
                let text = r.text().await.unwrap_or_default();
                warn!("[posthog] capture failed {status}: {text}");
            }
            Err(e) => warn!("[posthog] capture error: {e}"),
        }
    }

    async fn count(&self, event: &str) -> u64 {
        if self.config.project_id.is_empty() || self.config.personal_api_key.is_empty() {
            return 0;
        }

        let mut cache = self.cache.lock().await;
        if let Some(cached) = cache.as_ref() {
            if cached.event == event && cached.fetched_at.elapsed() < COUNT_CACHE_TTL {
                return cached.total;
            }
        }

        match self.query_count(event).await {
            Ok(total) => {
                *cache = Some(CachedCount {
                    event: event.to_string(),
                    fetched_at: Instant::now(),
                    total,
                });
                total
            }
            Err(e) => {
                warn!("[posthog] {e}");
                0
            }
        }
    }
}

/// Reads the count from a HogQL response: `results[0][0]`, `results[0].total`,
/// or a bare numeric `result`.
pub fn parse_total(data: &Value) -> u64 {
    let value = match data.get("results").and_then(Value::as_array) {
        Some(results) => match results.first() {
            Some(Value::Array(row)) => row.first(),
            Some(first) => first.get("total"),
            None => None,
        },
        None => data.get("result"),
    };

    match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}
