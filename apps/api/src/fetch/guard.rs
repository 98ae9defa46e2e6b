//! Fetch Guard: SSRF-hardened retrieval of a job posting by URL.
//!
//! Order of checks:
//! 1. parse the URL and require `https` (no I/O yet)
//! 2. resolve the host and reject private/loopback/link-local targets
//! 3. follow at most `max_hops` requests by hand, refusing loops and
//!    https → http downgrades, re-checking each redirect target's host
//! 4. accept only HTML / JSON-LD bodies, streamed against a byte ceiling
//! 5. run the extraction pipeline and reject near-empty results
//!
//! One deadline covers every request and body read across all hops.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info};
use url::Url;

use crate::extraction::{extract_jd, ExtractionResult, JdExtractor};
use crate::fetch::address::{check_host, HostResolver, SystemResolver};
use crate::fetch::error::FetchError;
use crate::fetch::transport::{HttpTransport, PageResponse, PageTransport, TransportError};

const REDIRECT_STATUSES: &[u16] = &[301, 302, 303, 307, 308];
const ACCEPTED_CONTENT_TYPES: &[&str] = &["text/html", "application/ld+json"];

pub const DEFAULT_USER_AGENT: &str =
    "JobKitBot/0.1 (+job description import; fetches a single posting on user request)";

/// Limits applied to every fetch. Passed in at construction time so tests can
/// tighten them.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Covers the whole multi-hop operation, DNS lookups excluded.
    pub timeout: Duration,
    pub max_bytes: usize,
    pub max_hops: usize,
    /// Extractions shorter than this (in chars) count as no text at all.
    pub min_text_chars: usize,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_bytes: 3 * 1024 * 1024,
            max_hops: 5,
            min_text_chars: 50,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// A successful fetch: the extraction plus the URL it was finally served from.
#[derive(Debug, Clone)]
pub struct FetchedPosting {
    pub extraction: ExtractionResult,
    pub final_url: Url,
}

/// Per-request fetch state. `visited` only grows; `bytes_read` never passes
/// the ceiling without aborting.
struct FetchOutcome {
    current_url: Url,
    visited: HashSet<String>,
    bytes_read: usize,
    started_at: Instant,
}

impl FetchOutcome {
    fn new(start: Url) -> Self {
        Self {
            current_url: start,
            visited: HashSet::new(),
            bytes_read: 0,
            started_at: Instant::now(),
        }
    }
}

pub struct FetchGuard {
    config: FetchConfig,
    transport: Arc<dyn PageTransport>,
    resolver: Arc<dyn HostResolver>,
    extractor: JdExtractor,
}

impl FetchGuard {
    /// Guard backed by `reqwest` and the system resolver.
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let transport =
            HttpTransport::new(&config.user_agent).map_err(|e| FetchError::Network(e.0))?;
        Ok(Self::with_parts(config, Arc::new(transport), Arc::new(SystemResolver)))
    }

    pub fn with_parts(
        config: FetchConfig,
        transport: Arc<dyn PageTransport>,
        resolver: Arc<dyn HostResolver>,
    ) -> Self {
        Self {
            config,
            transport,
            resolver,
            extractor: extract_jd,
        }
    }

    /// Replaces the extraction pipeline run on fetched pages.
    #[cfg(test)]
    pub fn with_extractor(mut self, extractor: JdExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Fetches `url` and extracts the job description it serves.
    ///
    /// Nothing is retried; every failure maps to one `FetchError` kind.
    pub async fn fetch_jd_from_url(&self, url: &str) -> Result<FetchedPosting, FetchError> {
        let start = validate_url(url)?;
        check_host(&start, self.resolver.as_ref()).await?;

        let (html, final_url) = self.fetch_html(start).await?;
        let extraction = (self.extractor)(&html, final_url.as_str());

        if extraction.text.chars().count() < self.config.min_text_chars {
            debug!(url = %final_url, chars = extraction.text.len(), "Extracted JD text too short");
            return Err(FetchError::NoExtractableText);
        }

        info!(
            url = %final_url,
            source = ?extraction.source,
            chars = extraction.text.len(),
            "Extracted job description from URL"
        );
        Ok(FetchedPosting {
            extraction,
            final_url,
        })
    }

    /// Runs the redirect loop and returns the decoded body with its final URL.
    async fn fetch_html(&self, start: Url) -> Result<(String, Url), FetchError> {
        let deadline = Instant::now() + self.config.timeout;
        let mut outcome = FetchOutcome::new(start);

        for hop in 0..self.config.max_hops {
            if !outcome.visited.insert(outcome.current_url.to_string()) {
                return Err(FetchError::RedirectLoop);
            }
            if hop > 0 {
                check_host(&outcome.current_url, self.resolver.as_ref()).await?;
            }

            let mut response = within(deadline, self.transport.get(&outcome.current_url))
                .await?
                .map_err(network_error)?;
            let status = response.status();

            if REDIRECT_STATUSES.contains(&status) {
                let location = response
                    .header("location")
                    .ok_or(FetchError::RedirectNoLocation)?;
                let next = outcome
                    .current_url
                    .join(location.trim())
                    .map_err(|_| FetchError::InvalidUrl)?;
                if next.scheme() != "https" {
                    return Err(FetchError::RedirectDowngraded);
                }
                debug!(hop, status, from = %outcome.current_url, to = %next, "Following redirect");
                outcome.current_url = next;
                continue;
            }

            if !(200..300).contains(&status) {
                return Err(FetchError::FetchFailed { status });
            }

            let content_type = response
                .header("content-type")
                .unwrap_or_default()
                .to_ascii_lowercase();
            if !ACCEPTED_CONTENT_TYPES
                .iter()
                .any(|accepted| content_type.contains(accepted))
            {
                return Err(FetchError::UnsupportedContentType(content_type));
            }

            let body = self
                .read_body(response.as_mut(), &mut outcome, deadline)
                .await?;
            debug!(
                url = %outcome.current_url,
                bytes = outcome.bytes_read,
                elapsed_ms = outcome.started_at.elapsed().as_millis() as u64,
                "Fetched page body"
            );
            return Ok((String::from_utf8_lossy(&body).into_owned(), outcome.current_url));
        }

        Err(FetchError::TooManyRedirects)
    }

    /// Streams the body, aborting the moment the running total passes the ceiling.
    async fn read_body(
        &self,
        response: &mut dyn PageResponse,
        outcome: &mut FetchOutcome,
        deadline: Instant,
    ) -> Result<Vec<u8>, FetchError> {
        let limit = self.config.max_bytes;

        let declared = response
            .header("content-length")
            .and_then(|v| v.trim().parse::<usize>().ok());
        if declared.is_some_and(|len| len > limit) {
            return Err(FetchError::ResponseTooLarge { limit });
        }

        let mut body = Vec::new();
        while let Some(chunk) = within(deadline, response.next_chunk())
            .await?
            .map_err(network_error)?
        {
            outcome.bytes_read += chunk.len();
            if outcome.bytes_read > limit {
                return Err(FetchError::ResponseTooLarge { limit });
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }
}

/// Parses a user-supplied URL and requires the `https` scheme.
pub fn validate_url(raw: &str) -> Result<Url, FetchError> {
    let url = Url::parse(raw.trim()).map_err(|_| FetchError::InvalidUrl)?;
    if url.scheme() != "https" {
        return Err(FetchError::UnsupportedScheme);
    }
    if url.host().is_none() {
        return Err(FetchError::InvalidUrl);
    }
    Ok(url)
}

async fn within<F: Future>(deadline: Instant, fut: F) -> Result<F::Output, FetchError> {
    tokio::time::timeout_at(deadline, fut)
        .await
        .map_err(|_| FetchError::Timeout)
}

fn network_error(e: TransportError) -> FetchError {
    FetchError::Network(e.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FixedResolver, ScriptedPage, ScriptedTransport};

    const JOB_HTML: &str = r#"<html><head><script type="application/ld+json">
        {"@type": "JobPosting", "title": "Staff Engineer",
         "description": "<p>Lead the design of our ingestion platform and mentor the team that runs it.</p>"}
        </script></head><body></body></html>"#;

    fn guard_with(transport: Arc<ScriptedTransport>, config: FetchConfig) -> FetchGuard {
        let resolver = FixedResolver::default()
            .with("jobs.example.com", "93.184.216.34")
            .with("careers.example.org", "93.184.216.35")
            .with("intranet.example.com", "10.0.0.8");
        FetchGuard::with_parts(config, transport, Arc::new(resolver))
    }

    fn guard(transport: Arc<ScriptedTransport>) -> FetchGuard {
        guard_with(transport, FetchConfig::default())
    }

    #[tokio::test]
    async fn test_fetches_and_extracts_structured_posting() {
        let transport = Arc::new(
            ScriptedTransport::default().page("https://jobs.example.com/1", ScriptedPage::html(JOB_HTML)),
        );
        let fetched = guard(transport).fetch_jd_from_url("https://jobs.example.com/1").await.unwrap();
        assert!(fetched.extraction.text.starts_with("Staff Engineer"));
        assert_eq!(fetched.final_url.host_str(), Some("jobs.example.com"));
    }

    #[tokio::test]
    async fn test_rejects_http_before_any_network_call() {
        let transport = Arc::new(ScriptedTransport::default());
        let result = guard(transport.clone()).fetch_jd_from_url("http://example.com").await;
        assert_eq!(result.unwrap_err(), FetchError::UnsupportedScheme);
        assert_eq!(transport.requests(), 0);
    }

    #[tokio::test]
    async fn test_rejects_unparseable_url() {
        let transport = Arc::new(ScriptedTransport::default());
        let result = guard(transport).fetch_jd_from_url("not a url").await;
        assert_eq!(result.unwrap_err(), FetchError::InvalidUrl);
    }

    #[tokio::test]
    async fn test_rejects_loopback_literal_and_private_dns() {
        let transport = Arc::new(ScriptedTransport::default());
        let g = guard(transport.clone());
        assert_eq!(
            g.fetch_jd_from_url("https://127.0.0.1/").await.unwrap_err(),
            FetchError::UnsupportedAddress
        );
        assert_eq!(
            g.fetch_jd_from_url("https://intranet.example.com/").await.unwrap_err(),
            FetchError::UnsupportedAddress
        );
        assert_eq!(
            g.fetch_jd_from_url("https://unknown.invalid/").await.unwrap_err(),
            FetchError::DnsFailed
        );
        assert_eq!(transport.requests(), 0);
    }

    #[tokio::test]
    async fn test_follows_relative_redirect() {
        let transport = Arc::new(
            ScriptedTransport::default()
                .page("https://jobs.example.com/old", ScriptedPage::redirect(301, "/new"))
                .page("https://jobs.example.com/new", ScriptedPage::html(JOB_HTML)),
        );
        let fetched = guard(transport.clone())
            .fetch_jd_from_url("https://jobs.example.com/old")
            .await
            .unwrap();
        assert_eq!(fetched.final_url.as_str(), "https://jobs.example.com/new");
        assert_eq!(transport.requests(), 2);
    }

    #[tokio::test]
    async fn test_redirect_loop_detected() {
        let transport = Arc::new(
            ScriptedTransport::default()
                .page("https://jobs.example.com/a", ScriptedPage::redirect(302, "https://jobs.example.com/b"))
                .page("https://jobs.example.com/b", ScriptedPage::redirect(307, "https://jobs.example.com/a")),
        );
        let result = guard(transport.clone()).fetch_jd_from_url("https://jobs.example.com/a").await;
        assert_eq!(result.unwrap_err(), FetchError::RedirectLoop);
        assert_eq!(transport.requests(), 2);
    }

    #[tokio::test]
    async fn test_too_many_redirects() {
        let mut transport = ScriptedTransport::default();
        for i in 0..6 {
            transport = transport.page(
                &format!("https://jobs.example.com/{i}"),
                ScriptedPage::redirect(308, &format!("/{}", i + 1)),
            );
        }
        let transport = Arc::new(transport);
        let result = guard(transport.clone()).fetch_jd_from_url("https://jobs.example.com/0").await;
        assert_eq!(result.unwrap_err(), FetchError::TooManyRedirects);
        assert_eq!(transport.requests(), 5);
    }

    #[tokio::test]
    async fn test_redirect_without_location() {
        let transport = Arc::new(
            ScriptedTransport::default().page("https://jobs.example.com/", ScriptedPage::status(302)),
        );
        let result = guard(transport).fetch_jd_from_url("https://jobs.example.com/").await;
        assert_eq!(result.unwrap_err(), FetchError::RedirectNoLocation);
    }

    #[tokio::test]
    async fn test_redirect_downgrade_rejected() {
        let transport = Arc::new(ScriptedTransport::default().page(
            "https://jobs.example.com/",
            ScriptedPage::redirect(301, "http://jobs.example.com/plain"),
        ));
        let result = guard(transport.clone()).fetch_jd_from_url("https://jobs.example.com/").await;
        assert_eq!(result.unwrap_err(), FetchError::RedirectDowngraded);
        assert_eq!(transport.requests(), 1);
    }

    #[tokio::test]
    async fn test_redirect_to_private_host_rejected() {
        let transport = Arc::new(ScriptedTransport::default().page(
            "https://jobs.example.com/",
            ScriptedPage::redirect(302, "https://intranet.example.com/admin"),
        ));
        let result = guard(transport.clone()).fetch_jd_from_url("https://jobs.example.com/").await;
        assert_eq!(result.unwrap_err(), FetchError::UnsupportedAddress);
        assert_eq!(transport.requests(), 1);
    }

    #[tokio::test]
    async fn test_upstream_error_status() {
        let transport = Arc::new(
            ScriptedTransport::default().page("https://jobs.example.com/gone", ScriptedPage::status(404)),
        );
        let result = guard(transport).fetch_jd_from_url("https://jobs.example.com/gone").await;
        assert_eq!(result.unwrap_err(), FetchError::FetchFailed { status: 404 });
    }

    #[tokio::test]
    async fn test_unsupported_content_type() {
        let transport = Arc::new(ScriptedTransport::default().page(
            "https://jobs.example.com/logo",
            ScriptedPage::html("binary").content_type("image/png"),
        ));
        let result = guard(transport).fetch_jd_from_url("https://jobs.example.com/logo").await;
        assert_eq!(
            result.unwrap_err(),
            FetchError::UnsupportedContentType("image/png".to_string())
        );
    }

    #[tokio::test]
    async fn test_oversized_body_aborts_mid_stream() {
        let chunk = vec![b'a'; 1024];
        let page = ScriptedPage::chunks(vec![chunk; 10]);
        let served = page.served_counter();
        let transport =
            Arc::new(ScriptedTransport::default().page("https://jobs.example.com/big", page));
        let config = FetchConfig {
            max_bytes: 4096,
            ..FetchConfig::default()
        };
        let result = guard_with(transport, config)
            .fetch_jd_from_url("https://jobs.example.com/big")
            .await;
        assert_eq!(result.unwrap_err(), FetchError::ResponseTooLarge { limit: 4096 });
        assert_eq!(served.load(std::sync::atomic::Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_declared_length_over_limit_rejected_before_reading() {
        let page = ScriptedPage::html(JOB_HTML).with_header("content-length", "999999999");
        let served = page.served_counter();
        let transport =
            Arc::new(ScriptedTransport::default().page("https://jobs.example.com/1", page));
        let result = guard(transport).fetch_jd_from_url("https://jobs.example.com/1").await;
        assert!(matches!(result, Err(FetchError::ResponseTooLarge { .. })));
        assert_eq!(served.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_near_empty_page_is_no_extractable_text() {
        let transport = Arc::new(ScriptedTransport::default().page(
            "https://jobs.example.com/empty",
            ScriptedPage::html("<html><body><p>Loading…</p></body></html>"),
        ));
        let result = guard(transport).fetch_jd_from_url("https://jobs.example.com/empty").await;
        assert_eq!(result.unwrap_err(), FetchError::NoExtractableText);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_covers_slow_response() {
        let transport = Arc::new(ScriptedTransport::default().page(
            "https://jobs.example.com/slow",
            ScriptedPage::html(JOB_HTML).delayed(Duration::from_secs(30)),
        ));
        let result = guard(transport).fetch_jd_from_url("https://jobs.example.com/slow").await;
        assert_eq!(result.unwrap_err(), FetchError::Timeout);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_shared_across_hops() {
        let config = FetchConfig {
            timeout: Duration::from_secs(10),
            ..FetchConfig::default()
        };
        let transport = Arc::new(
            ScriptedTransport::default()
                .page(
                    "https://jobs.example.com/a",
                    ScriptedPage::redirect(302, "/b").delayed(Duration::from_secs(6)),
                )
                .page(
                    "https://jobs.example.com/b",
                    ScriptedPage::html(JOB_HTML).delayed(Duration::from_secs(6)),
                ),
        );
        let result = guard_with(transport, config)
            .fetch_jd_from_url("https://jobs.example.com/a")
            .await;
        assert_eq!(result.unwrap_err(), FetchError::Timeout);
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url(" https://jobs.example.com/1 ").is_ok());
        assert_eq!(validate_url("ftp://example.com").unwrap_err(), FetchError::UnsupportedScheme);
        assert_eq!(validate_url("").unwrap_err(), FetchError::InvalidUrl);
    }
}
