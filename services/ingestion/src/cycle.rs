//! Ingestion cycle
//!
//! One full fetch → normalize → upsert pass over every feed. Feeds are
//! fanned out concurrently and joined; a branch never fails its siblings.
//! Inside a branch, normalization and writes are sequential.

use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use serde::Serialize;
use tracing::{info, warn};
use types::time::now_millis;

use persistence::EarthquakeStore;

use crate::client::FeedSource;
use crate::feed::Feed;
use crate::normalize::Normalizer;

/// Outcome of one feed within a cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedReport {
    pub feed: &'static str,
    /// Raw entries received
    pub fetched: usize,
    /// Entries dropped by the normalizer
    pub rejected: usize,
    /// Records the store reported as written
    pub written: usize,
    /// Fetch failure, if the feed contributed nothing
    pub error: Option<String>,
}

impl FeedReport {
    fn failed(feed: Feed, error: String) -> Self {
        Self {
            feed: feed.label(),
            fetched: 0,
            rejected: 0,
            written: 0,
            error: Some(error),
        }
    }
}

/// Outcome of one ingestion cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleReport {
    pub started_at: i64,
    pub duration_ms: u64,
    pub feeds: Vec<FeedReport>,
}

impl CycleReport {
    pub fn written(&self) -> usize {
        self.feeds.iter().map(|f| f.written).sum()
    }

    pub fn rejected(&self) -> usize {
        self.feeds.iter().map(|f| f.rejected).sum()
    }

    pub fn failed_feeds(&self) -> usize {
        self.feeds.iter().filter(|f| f.error.is_some()).count()
    }

    pub fn feed(&self, feed: Feed) -> Option<&FeedReport> {
        self.feeds.iter().find(|f| f.feed == feed.label())
    }
}

/// Runs ingestion cycles against one source and one store.
pub struct Ingestor {
    source: Arc<dyn FeedSource>,
    store: Arc<dyn EarthquakeStore>,
    normalizer: Normalizer,
}

impl Ingestor {
    pub fn new(source: Arc<dyn FeedSource>, store: Arc<dyn EarthquakeStore>) -> Self {
        let normalizer = Normalizer::new(source.base_url());
        Self {
            source,
            store,
            normalizer,
        }
    }

    /// Fetch, normalize and store every feed. Never fails; problems are
    /// logged and show up in the report.
    pub async fn run_cycle(&self) -> CycleReport {
        let started_at = now_millis();
        let clock = Instant::now();

        let feeds = join_all(Feed::ALL.iter().map(|feed| self.ingest_feed(*feed))).await;

        let report = CycleReport {
            started_at,
            duration_ms: clock.elapsed().as_millis() as u64,
            feeds,
        };

        info!(
            written = report.written(),
            rejected = report.rejected(),
            failed_feeds = report.failed_feeds(),
            duration_ms = report.duration_ms,
            "Ingestion cycle finished"
        );
        report
    }

    async fn ingest_feed(&self, feed: Feed) -> FeedReport {
        let entries = match self.source.fetch(feed).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(feed = %feed, error = %e, "Feed fetch failed");
                return FeedReport::failed(feed, e.to_string());
            }
        };

        let batch = self.normalizer.normalize_batch(&entries, now_millis());
        for (index, e) in &batch.rejected {
            warn!(feed = %feed, index, error = %e, "Dropping malformed entry");
        }

        let written = self.store.upsert_batch(&batch.records).await;
        if written < batch.records.len() {
            warn!(
                feed = %feed,
                written,
                attempted = batch.records.len(),
                "Some records were not stored"
            );
        }

        FeedReport {
            feed: feed.label(),
            fetched: entries.len(),
            rejected: batch.rejected.len(),
            written,
            error: None,
        }
    }
}
