use std::time::Duration;

use anyhow::{Context, Result};

use crate::fetch::FetchConfig;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// `production` or anything else (treated as development).
    pub app_env: String,
    /// Origins allowed by CORS in production.
    pub allowed_origins: Vec<String>,
    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_base_url: String,
    pub fetch: FetchConfig,
    pub posthog: PostHogConfig,
}

/// PostHog credentials for the active environment.
#[derive(Debug, Clone)]
pub struct PostHogConfig {
    pub ingestion_host: String,
    pub api_host: String,
    pub project_key: String,
    pub project_id: String,
    pub personal_api_key: String,
}

impl Default for PostHogConfig {
    fn default() -> Self {
        Self {
            ingestion_host: "https://us.i.posthog.com".to_string(),
            api_host: "https://app.posthog.com".to_string(),
            project_key: String::new(),
            project_id: String::new(),
            personal_api_key: String::new(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let app_env = env_or("APP_ENV", "development");
        let is_production = app_env == "production";

        let defaults = FetchConfig::default();
        let fetch = FetchConfig {
            timeout: Duration::from_millis(parse_env(
                "JD_FETCH_TIMEOUT_MS",
                defaults.timeout.as_millis() as u64,
            )?),
            max_bytes: parse_env("JD_FETCH_MAX_BYTES", defaults.max_bytes)?,
            ..defaults
        };

        let stage = if is_production { "PROD" } else { "DEV" };
        let posthog_defaults = PostHogConfig::default();
        let posthog = PostHogConfig {
            ingestion_host: env_or("POSTHOG_INGESTION_HOST", &posthog_defaults.ingestion_host),
            api_host: env_or("POSTHOG_API_HOST", &posthog_defaults.api_host),
            project_key: env_or(&format!("POSTHOG_{stage}_PROJECT_KEY"), ""),
            project_id: env_or(&format!("POSTHOG_{stage}_PROJECT_ID"), ""),
            personal_api_key: env_or(&format!("POSTHOG_{stage}_PERSONAL_API_KEY"), ""),
        };

        Ok(Config {
            port: parse_env("PORT", 8787)?,
            rust_log: env_or("RUST_LOG", "info"),
            allowed_origins: split_origins(&env_or("ALLOWED_ORIGIN", "")),
            app_env,
            openai_api_key: require_env("OPENAI_API_KEY")?,
            openai_model: env_or("OPENAI_MODEL", "gpt-4o-mini"),
            openai_base_url: env_or("OPENAI_BASE_URL", "https://api.openai.com/v1"),
            fetch,
            posthog,
        })
    }

    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number")),
        _ => Ok(default),
    }
}

/// Splits a comma-separated origin list, dropping blanks.
pub fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
impl Config {
    /// Development config with no credentials, for handler and router tests.
    pub fn for_tests() -> Self {
        Config {
            port: 0,
            rust_log: "debug".to_string(),
            app_env: "development".to_string(),
            allowed_origins: Vec::new(),
            openai_api_key: "sk-test".to_string(),
            openai_model: "gpt-4o-mini".to_string(),
            openai_base_url: "http://127.0.0.1:9".to_string(),
            fetch: FetchConfig::default(),
            posthog: PostHogConfig::default(),
        }
    }
}
