//! Test doubles shared by the unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use persistence::{EarthquakeStore, ListQuery, MemoryStore, Page, StoreError, StoreResult};
use tokio::sync::{Barrier, Notify, Semaphore};
use types::record::EarthquakeRecord;

use crate::client::{FeedSource, FetchError};
use crate::feed::{Feed, RawEntry};

pub fn entry(datetime: &str, coordinates: &str, magnitude: &str) -> RawEntry {
    RawEntry {
        date: "15 Jan 2024".to_string(),
        time: "10:21:45 WIB".to_string(),
        datetime: datetime.to_string(),
        coordinates: coordinates.to_string(),
        magnitude: magnitude.to_string(),
        depth: "10 km".to_string(),
        region: "Pusat gempa berada di laut 20 km Tenggara Ambon".to_string(),
        tsunami_potential: Some("Tidak berpotensi tsunami".to_string()),
        felt_status: None,
        shakemap: None,
        decode_error: None,
    }
}

/// Canned per-feed responses; a missing feed answers HTTP 503.
#[derive(Default)]
pub struct StubSource {
    pub responses: HashMap<Feed, Vec<RawEntry>>,
    pub calls: AtomicUsize,
    /// When set, every fetch waits here until all three feeds are in flight
    pub barrier: Option<Barrier>,
    /// When set, every fetch parks until a permit is added
    pub gate: Option<Arc<Semaphore>>,
    pub entered: Arc<Notify>,
}

impl StubSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, feed: Feed, entries: Vec<RawEntry>) -> Self {
        self.responses.insert(feed, entries);
        self
    }
}

#[async_trait]
impl FeedSource for StubSource {
    async fn fetch(&self, feed: Feed) -> Result<Vec<RawEntry>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }
        if let Some(gate) = &self.gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
        self.responses.get(&feed).cloned().ok_or_else(|| FetchError::Status {
            url: feed.url(self.base_url()),
            status: 503,
        })
    }

    fn base_url(&self) -> &str {
        "https://data.bmkg.go.id/DataMKG/TEWS"
    }
}

/// Memory store that refuses writes for selected ids.
pub struct FlakyStore {
    pub inner: MemoryStore,
    pub reject_ids: Vec<String>,
}

#[async_trait]
impl EarthquakeStore for FlakyStore {
    fn backend(&self) -> &'static str {
        "flaky"
    }

    async fn upsert(&self, record: &EarthquakeRecord) -> StoreResult<()> {
        if self.reject_ids.iter().any(|id| id == record.id.as_str()) {
            return Err(StoreError::Backend(format!("write refused for {}", record.id)));
        }
        self.inner.upsert(record).await
    }

    async fn get(&self, id: &str) -> StoreResult<Option<EarthquakeRecord>> {
        self.inner.get(id).await
    }

    async fn latest(&self) -> StoreResult<Option<EarthquakeRecord>> {
        self.inner.latest().await
    }

    async fn page(&self, query: &ListQuery) -> StoreResult<Page> {
        self.inner.page(query).await
    }

    async fn all(&self) -> StoreResult<Vec<EarthquakeRecord>> {
        self.inner.all().await
    }
}
