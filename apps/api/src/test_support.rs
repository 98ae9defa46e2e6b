//! In-process stand-ins for the network, DNS, LLM and analytics seams.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use tokio::sync::Notify;
use url::Url;

use crate::analytics::EventCounter;
use crate::config::Config;
use crate::extraction::{extract_jd, JdExtractor};
use crate::fetch::address::HostResolver;
use crate::fetch::transport::{PageResponse, PageTransport, TransportError};
use crate::fetch::FetchGuard;
use crate::llm_client::{LlmError, LlmHealth, TextCompletion};
use crate::resume::FileTextExtractor;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// DNS
// ────────────────────────────────────────────────────────────────────────────

/// Resolver with a fixed host table; unknown hosts fail like NXDOMAIN.
#[derive(Default)]
pub struct FixedResolver {
    hosts: HashMap<String, IpAddr>,
    lookups: AtomicUsize,
}

impl FixedResolver {
    pub fn with(mut self, host: &str, ip: &str) -> Self {
        let ip = ip.parse().expect("valid IP in test fixture");
        self.hosts.insert(host.to_string(), ip);
        self
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HostResolver for FixedResolver {
    async fn resolve(&self, host: &str, _port: u16) -> std::io::Result<Option<IpAddr>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.hosts
            .get(host)
            .copied()
            .map(Some)
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, "no such host"))
    }
}

pub fn public_resolver() -> FixedResolver {
    FixedResolver::default()
        .with("jobs.example.com", "93.184.216.34")
        .with("careers.example.org", "93.184.216.35")
        .with("intranet.example.com", "10.0.0.8")
}

// ────────────────────────────────────────────────────────────────────────────
// HTTP
// ────────────────────────────────────────────────────────────────────────────

/// A canned response. Cloned per request; `served` is shared so tests can see
/// how many body chunks the guard actually pulled.
#[derive(Clone)]
pub struct ScriptedPage {
    status: u16,
    headers: Vec<(String, String)>,
    chunks: Vec<Bytes>,
    delay: Option<Duration>,
    served: Arc<AtomicUsize>,
}

impl ScriptedPage {
    pub fn status(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            chunks: Vec::new(),
            delay: None,
            served: Arc::default(),
        }
    }

    pub fn html(body: &str) -> Self {
        Self {
            chunks: vec![Bytes::from(body.to_string())],
            ..Self::status(200)
        }
        .content_type("text/html; charset=utf-8")
    }

    pub fn chunks(chunks: Vec<Vec<u8>>) -> Self {
        Self {
            chunks: chunks.into_iter().map(Bytes::from).collect(),
            ..Self::status(200)
        }
        .content_type("text/html")
    }

    pub fn redirect(status: u16, location: &str) -> Self {
        Self::status(status).with_header("location", location)
    }

    pub fn content_type(self, value: &str) -> Self {
        self.with_header("content-type", value)
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        let name = name.to_ascii_lowercase();
        self.headers.retain(|(existing, _)| *existing != name);
        self.headers.push((name, value.to_string()));
        self
    }

    /// Delays the response headers by `delay`.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn served_counter(&self) -> Arc<AtomicUsize> {
        self.served.clone()
    }
}

struct ScriptedResponse {
    page: ScriptedPage,
    next: usize,
}

#[async_trait]
impl PageResponse for ScriptedResponse {
    fn status(&self) -> u16 {
        self.page.status
    }

    fn header(&self, name: &str) -> Option<String> {
        let name = name.to_ascii_lowercase();
        self.page
            .headers
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.clone())
    }

    async fn next_chunk(&mut self) -> Result<Option<Bytes>, TransportError> {
        let chunk = self.page.chunks.get(self.next).cloned();
        if chunk.is_some() {
            self.next += 1;
            self.page.served.fetch_add(1, Ordering::SeqCst);
        }
        Ok(chunk)
    }
}

/// Transport serving `ScriptedPage`s keyed by exact URL.
#[derive(Default)]
pub struct ScriptedTransport {
    pages: HashMap<String, ScriptedPage>,
    requests: AtomicUsize,
}

impl ScriptedTransport {
    pub fn page(mut self, url: &str, page: ScriptedPage) -> Self {
        self.pages.insert(url.to_string(), page);
        self
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageTransport for ScriptedTransport {
    async fn get(&self, url: &Url) -> Result<Box<dyn PageResponse>, TransportError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let page = self
            .pages
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| TransportError(format!("connection refused: {url}")))?;
        if let Some(delay) = page.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(Box::new(ScriptedResponse { page, next: 0 }))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// LLM
// ────────────────────────────────────────────────────────────────────────────

pub struct StubLlm {
    reply: String,
    delay: Option<Duration>,
    calls: AtomicUsize,
    last_input: Mutex<Option<String>>,
}

impl StubLlm {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            delay: None,
            calls: AtomicUsize::new(0),
            last_input: Mutex::new(None),
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_input(&self) -> Option<String> {
        self.last_input.lock().unwrap().clone()
    }
}

impl Default for StubLlm {
    fn default() -> Self {
        Self::replying("Opening paragraph.\n\nMiddle paragraph.\n\nClosing paragraph.")
    }
}

#[async_trait]
impl TextCompletion for StubLlm {
    async fn complete(
        &self,
        _instructions: &str,
        input: &str,
        _max_output_tokens: u32,
    ) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_input.lock().unwrap() = Some(input.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.reply.clone())
    }

    async fn check_health(&self) -> LlmHealth {
        LlmHealth::from_status("stub-model", 200, Some(1))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Analytics
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingCounter {
    recorded: Mutex<Vec<String>>,
    total: AtomicU64,
    notify: Notify,
}

impl RecordingCounter {
    pub fn set_total(&self, total: u64) {
        self.total.store(total, Ordering::SeqCst);
    }

    pub fn recorded(&self) -> Vec<String> {
        self.recorded.lock().unwrap().clone()
    }

    /// Waits (up to a second) until at least `n` events were recorded.
    pub async fn wait_for_records(&self, n: usize) {
        let wait = async {
            loop {
                let notified = self.notify.notified();
                if self.recorded.lock().unwrap().len() >= n {
                    return;
                }
                notified.await;
            }
        };
        let _ = tokio::time::timeout(Duration::from_secs(1), wait).await;
    }
}

#[async_trait]
impl EventCounter for RecordingCounter {
    async fn record(&self, event: &str, _properties: Value) {
        self.recorded.lock().unwrap().push(event.to_string());
        self.notify.notify_waiters();
    }

    async fn count(&self, _event: &str) -> u64 {
        self.total.load(Ordering::SeqCst)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// App state
// ────────────────────────────────────────────────────────────────────────────

/// Builds an `AppState` whose collaborators are all in-process stubs, keeping
/// handles so tests can script and inspect them.
pub struct TestHarness {
    pub config: Config,
    pub transport: Arc<ScriptedTransport>,
    pub llm: Arc<StubLlm>,
    pub events: Arc<RecordingCounter>,
    pub extractor: JdExtractor,
}

impl Default for TestHarness {
    fn default() -> Self {
        Self {
            config: Config::for_tests(),
            transport: Arc::default(),
            llm: Arc::default(),
            events: Arc::default(),
            extractor: extract_jd,
        }
    }
}

impl TestHarness {
    pub fn with_pages(mut self, pages: Vec<(&str, ScriptedPage)>) -> Self {
        let transport = pages
            .into_iter()
            .fold(ScriptedTransport::default(), |t, (url, page)| t.page(url, page));
        self.transport = Arc::new(transport);
        self
    }

    pub fn with_llm(mut self, llm: StubLlm) -> Self {
        self.llm = Arc::new(llm);
        self
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn with_extractor(mut self, extractor: JdExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn state(&self) -> AppState {
        let guard = FetchGuard::with_parts(
            self.config.fetch.clone(),
            self.transport.clone(),
            Arc::new(public_resolver()),
        )
        .with_extractor(self.extractor);
        AppState {
            config: self.config.clone(),
            fetch_guard: Arc::new(guard),
            llm: self.llm.clone(),
            documents: Arc::new(FileTextExtractor),
            events: self.events.clone(),
        }
    }
}
