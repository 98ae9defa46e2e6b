/// LLM Client: the single point of entry for all text completion calls.
///
/// ARCHITECTURAL RULE: No other module may call the OpenAI API directly.
/// Handlers depend on the `TextCompletion` trait held in `AppState`.
///
/// Talks to the OpenAI Responses API. Models disagree about which sampling and
/// length parameters they accept, so a 400 naming an unsupported parameter
/// downgrades the request and retries instead of failing.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, warn};

pub const PROVIDER: &str = "openai";
/// Output budget for short generations such as cover letters.
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 700;
const TEMPERATURE: f32 = 0.3;
const MAX_ATTEMPTS: u32 = 4;
const INITIAL_BACKOFF: Duration = Duration::from_millis(500);
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Request failed after {retries} attempts")]
    RateLimited { retries: u32 },

    #[error("OPENAI_API_KEY is not configured")]
    MissingKey,
}

/// Opaque text completion service.
#[async_trait]
pub trait TextCompletion: Send + Sync {
    /// Runs one completion capped at `max_output_tokens`. The returned text may
    /// be empty; callers decide whether that is an error.
    async fn complete(
        &self,
        instructions: &str,
        input: &str,
        max_output_tokens: u32,
    ) -> Result<String, LlmError>;

    /// Probes credentials and reachability. Never fails; problems are reported
    /// in the returned value.
    async fn check_health(&self) -> LlmHealth;
}

// ────────────────────────────────────────────────────────────────────────────
// Request shaping
// ────────────────────────────────────────────────────────────────────────────

/// Name of the output-length parameter, in fallback order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenParam {
    MaxOutputTokens,
    MaxTokens,
    MaxCompletionTokens,
}

impl TokenParam {
    fn key(self) -> &'static str {
        match self {
            TokenParam::MaxOutputTokens => "max_output_tokens",
            TokenParam::MaxTokens => "max_tokens",
            TokenParam::MaxCompletionTokens => "max_completion_tokens",
        }
    }
}

/// Which optional parameters the next attempt sends.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RequestOptions {
    token_param: Option<TokenParam>,
    include_temperature: bool,
    include_response_format: bool,
    include_modalities: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            token_param: Some(TokenParam::MaxOutputTokens),
            include_temperature: true,
            include_response_format: true,
            include_modalities: true,
        }
    }
}

impl RequestOptions {
    fn build_body(&self, model: &str, instructions: &str, input: &str, max_output_tokens: u32) -> Value {
        let mut body = json!({
            "model": model,
            "instructions": instructions,
            "input": input,
        });
        if let Some(param) = self.token_param {
            body[param.key()] = json!(max_output_tokens);
        }
        if self.include_temperature {
            body["temperature"] = json!(TEMPERATURE);
        }
        if self.include_response_format {
            body["response_format"] = json!({ "type": "text" });
        }
        if self.include_modalities {
            body["modalities"] = json!(["text"]);
        }
        body
    }

    /// Adjusts the options after a 400 error body. Returns false when the error
    /// is not about a parameter we can change, in which case it is final.
    fn downgrade(&mut self, error_body: &str) -> bool {
        let lower = error_body.to_lowercase();
        let unsupported = lower.contains("unsupported parameter");
        let unknown = unsupported || lower.contains("unknown parameter");

        match self.token_param {
            Some(TokenParam::MaxOutputTokens) if unsupported && lower.contains("max_output_tokens") => {
                self.token_param = Some(TokenParam::MaxTokens);
                return true;
            }
            Some(TokenParam::MaxTokens) if unsupported && lower.contains("max_tokens") => {
                self.token_param = Some(TokenParam::MaxCompletionTokens);
                return true;
            }
            _ => {}
        }

        if self.include_temperature
            && lower.contains("temperature")
            && (unsupported || lower.contains("unsupported value"))
        {
            self.include_temperature = false;
            return true;
        }
        if self.include_response_format && unknown && lower.contains("response_format") {
            self.include_response_format = false;
            return true;
        }
        if self.include_modalities && unknown && lower.contains("modalities") {
            self.include_modalities = false;
            return true;
        }
        false
    }
}

/// Pulls the generated text out of a Responses API payload.
///
/// Prefers `output_text`, then the text parts of `output[].content[]`, then a
/// chat-completions shaped `choices[0].message.content`.
pub fn extract_output_text(data: &Value) -> String {
    if let Some(text) = data.get("output_text").and_then(Value::as_str) {
        return text.trim().to_string();
    }

    if let Some(items) = data.get("output").and_then(Value::as_array) {
        let parts: Vec<&str> = items
            .iter()
            .filter_map(|item| item.get("content").and_then(Value::as_array))
            .flatten()
            .filter_map(|part| part.get("text").and_then(Value::as_str))
            .filter(|text| !text.trim().is_empty())
            .collect();
        return parts.join("\n\n").trim().to_string();
    }

    data.pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// Substitutes `{placeholder}` keys in one pass over `template`, so text
/// inserted for one key is never scanned for another.
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        match values.iter().find(|(key, _)| tail.starts_with(key)) {
            Some((key, value)) => {
                out.push_str(value);
                rest = &tail[key.len()..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

// ────────────────────────────────────────────────────────────────────────────
// Health
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthAuth {
    Ok,
    MissingKey,
    Unauthorized,
    Forbidden,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LlmHealth {
    pub ok: bool,
    pub provider: &'static str,
    pub model: String,
    pub has_key: bool,
    pub reachable: bool,
    pub auth: HealthAuth,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub models_count: Option<usize>,
}

impl LlmHealth {
    pub fn missing_key(model: &str) -> Self {
        Self {
            ok: false,
            provider: PROVIDER,
            model: model.to_string(),
            has_key: false,
            reachable: false,
            auth: HealthAuth::MissingKey,
            status: None,
            models_count: None,
        }
    }

    /// The provider could not be reached at all (timeout or connect failure).
    pub fn unreachable(model: &str) -> Self {
        Self {
            has_key: true,
            auth: HealthAuth::Unknown,
            ..Self::missing_key(model)
        }
    }

    /// Classifies a `/models` probe response.
    pub fn from_status(model: &str, status: u16, models_count: Option<usize>) -> Self {
        let auth = match status {
            401 => HealthAuth::Unauthorized,
            403 => HealthAuth::Forbidden,
            200..=299 => HealthAuth::Ok,
            _ => HealthAuth::Unknown,
        };
        let ok = auth == HealthAuth::Ok;
        Self {
            ok,
            provider: PROVIDER,
            model: model.to_string(),
            has_key: true,
            reachable: true,
            auth,
            status: Some(status),
            models_count: if ok { models_count } else { None },
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

/// OpenAI Responses API client with adaptive retries.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    initial_backoff: Duration,
}

impl LlmClient {
    pub fn new(api_key: String, model: String, base_url: String) -> Result<Self, LlmError> {
        let client = Client::builder().timeout(Duration::from_secs(60)).build()?;
        Ok(Self {
            client,
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            initial_backoff: INITIAL_BACKOFF,
        })
    }

    #[cfg(test)]
    fn with_backoff(mut self, initial_backoff: Duration) -> Self {
        self.initial_backoff = initial_backoff;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TextCompletion for LlmClient {
    /// Retries transport failures, 429 (rate limit) and 5xx errors with
    /// exponential backoff, and 400s that name a parameter the model does not
    /// accept immediately. The final attempt never sleeps.
    async fn complete(
        &self,
        instructions: &str,
        input: &str,
        max_output_tokens: u32,
    ) -> Result<String, LlmError> {
        if self.api_key.is_empty() {
            return Err(LlmError::MissingKey);
        }

        let url = format!("{}/responses", self.base_url);
        let mut options = RequestOptions::default();
        let mut last_error: Option<LlmError> = None;
        let mut backoff = self.initial_backoff;

        for attempt in 0..MAX_ATTEMPTS {
            let final_attempt = attempt + 1 == MAX_ATTEMPTS;
            let body = options.build_body(&self.model, instructions, input, max_output_tokens);
            let response = self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    warn!("LLM request failed on attempt {attempt}: {e}");
                    last_error = Some(LlmError::Http(e));
                    if !final_attempt {
                        tokio::time::sleep(backoff).await;
                        backoff *= 2;
                    }
                    continue;
                }
            };

            let status = response.status();

            if status.is_success() {
                let data: Value = response.json().await?;
                debug!(attempt, "LLM call succeeded");
                return Ok(extract_output_text(&data));
            }

            let text = response.text().await.unwrap_or_default();

            if status == StatusCode::BAD_REQUEST && options.downgrade(&text) {
                debug!(attempt, ?options, "LLM rejected a parameter, retrying downgraded");
                continue;
            }

            if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: text,
                });
                if !final_attempt {
                    warn!(
                        "LLM API returned {} on attempt {}, retrying after {:?}",
                        status, attempt, backoff
                    );
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
                continue;
            }

            return Err(LlmError::Api {
                status: status.as_u16(),
                message: text,
            });
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: MAX_ATTEMPTS,
        }))
    }

    async fn check_health(&self) -> LlmHealth {
        if self.api_key.is_empty() {
            return LlmHealth::missing_key(&self.model);
        }

        let result = self
            .client
            .get(format!("{}/models", self.base_url))
            .bearer_auth(&self.api_key)
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await;

        match result {
            Ok(response) => {
                let status = response.status().as_u16();
                let models_count = if response.status().is_success() {
                    response
                        .json::<Value>()
                        .await
                        .ok()
                        .and_then(|v| v.get("data").and_then(Value::as_array).map(Vec::len))
                } else {
                    None
                };
                LlmHealth::from_status(&self.model, status, models_count)
            }
            Err(e) if e.is_timeout() || e.is_connect() => LlmHealth::unreachable(&self.model),
            Err(e) => {
                warn!("LLM health probe failed: {e}");
                LlmHealth {
                    reachable: true,
                    ..LlmHealth::unreachable(&self.model)
                }
            }
        }
    }
}
