// src/fetch.rs
//! Outbound page fetching behind a trait seam, so the extractor and the
//! feed poller run on fixtures in tests instead of the network.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::FetchCfg;

#[derive(Debug, Error)]
pub enum FetchError {
    /// Non-2xx response. The status is kept for the article's fetch_error
    /// annotation.
    #[error("HTTP {0}")]
    Http(u16),
    #[error("request timed out")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
}

#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub status: u16,
    pub body: String,
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// GET the URL, following redirects. Returns Ok only for 2xx.
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError>;
}

/// Production fetcher: reqwest with an identifying user agent, a bounded
/// timeout, and rustls.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(cfg: &FetchCfg) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&cfg.user_agent)
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let resp = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::Network(e.to_string())
            }
        })?;

        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            return Err(FetchError::Http(status));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        Ok(FetchedPage { status, body })
    }
}

/// Fixture fetcher for tests: a static url -> response map.
#[derive(Default)]
pub struct FixtureFetcher {
    pages: std::collections::HashMap<String, Result<FetchedPage, u16>>,
}

impl FixtureFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, body: &str) -> Self {
        self.pages.insert(
            url.to_string(),
            Ok(FetchedPage {
                status: 200,
                body: body.to_string(),
            }),
        );
        self
    }

    pub fn with_status(mut self, url: &str, status: u16) -> Self {
        self.pages.insert(url.to_string(), Err(status));
        self
    }
}

#[async_trait]
impl PageFetcher for FixtureFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        match self.pages.get(url) {
            Some(Ok(page)) => Ok(page.clone()),
            Some(Err(status)) => Err(FetchError::Http(*status)),
            None => Err(FetchError::Network(format!("no fixture for {url}"))),
        }
    }
}
