//! HTTP transport seam for the fetch guard. The guard drives redirects, limits,
//! and timeouts itself; a transport only issues single GETs and streams bodies.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::redirect::Policy;
use reqwest::Client;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        TransportError(e.to_string())
    }
}

/// A response whose body has not been read yet.
#[async_trait]
pub trait PageResponse: Send {
    fn status(&self) -> u16;

    fn header(&self, name: &str) -> Option<String>;

    /// Next body chunk, `None` at end of body.
    async fn next_chunk(&mut self) -> Result<Option<Bytes>, TransportError>;
}

#[async_trait]
pub trait PageTransport: Send + Sync {
    /// Issues one GET without following redirects.
    async fn get(&self, url: &Url) -> Result<Box<dyn PageResponse>, TransportError>;
}

/// `reqwest`-backed transport with redirects disabled.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(user_agent: &str) -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .redirect(Policy::none())
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageTransport for HttpTransport {
    async fn get(&self, url: &Url) -> Result<Box<dyn PageResponse>, TransportError> {
        let response = self
            .client
            .get(url.clone())
            .header(
                reqwest::header::ACCEPT,
                "text/html,application/xhtml+xml,application/ld+json;q=0.9,*/*;q=0.5",
            )
            .send()
            .await?;
        Ok(Box::new(HttpPage(response)))
    }
}

struct HttpPage(reqwest::Response);

#[async_trait]
impl PageResponse for HttpPage {
    fn status(&self) -> u16 {
        self.0.status().as_u16()
    }

    fn header(&self, name: &str) -> Option<String> {
        self.0
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    async fn next_chunk(&mut self) -> Result<Option<Bytes>, TransportError> {
        Ok(self.0.chunk().await?)
    }
}
