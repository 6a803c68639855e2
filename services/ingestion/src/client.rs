//! Feed client
//!
//! Fetches one feed document over HTTP with a bounded timeout. Network
//! errors, timeouts, non-success statuses and malformed bodies all come
//! back as a `FetchError` for that feed only; callers decide what a
//! failed feed means for the cycle.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::feed::{Feed, FeedDocument, RawEntry, DEFAULT_FEED_BASE_URL};

/// Per-fetch timeout used unless configured otherwise.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

const USER_AGENT: &str = concat!("quakewatch-ingestion/", env!("CARGO_PKG_VERSION"));

// ── Errors ──────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("malformed feed document from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

// ── Source trait ────────────────────────────────────────────────────

/// Anything that can produce the raw entries of a feed.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self, feed: Feed) -> Result<Vec<RawEntry>, FetchError>;

    /// Origin that relative shakemap paths resolve against.
    fn base_url(&self) -> &str;
}

// ── HTTP client ─────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct FeedClient {
    http: reqwest::Client,
    base_url: String,
}

impl FeedClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Client for the public agency feeds with the default timeout.
    pub fn public() -> Result<Self, FetchError> {
        Self::new(DEFAULT_FEED_BASE_URL, DEFAULT_FETCH_TIMEOUT)
    }
}

#[async_trait]
impl FeedSource for FeedClient {
    async fn fetch(&self, feed: Feed) -> Result<Vec<RawEntry>, FetchError> {
        let url = feed.url(&self.base_url);
        let classify = |source: reqwest::Error| {
            if source.is_timeout() {
                FetchError::Timeout { url: url.clone() }
            } else {
                FetchError::Request { url: url.clone(), source }
            }
        };

        let response = self.http.get(&url).send().await.map_err(classify)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(classify)?;
        let document: FeedDocument =
            serde_json::from_slice(&body).map_err(|source| FetchError::Decode {
                url: url.clone(),
                source,
            })?;

        let entries = document.into_entries();
        debug!(feed = %feed, entries = entries.len(), bytes = body.len(), "Feed fetched");
        Ok(entries)
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}
