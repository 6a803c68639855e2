//! Store contract shared by every backend
//!
//! Write side: idempotent upsert keyed by `EventId`, plus a non-atomic
//! batch upsert that reports how many records landed.
//! Read side: page, latest, point lookup and full scan.
//!
//! Availability is explicit: callers hold a [`StoreHandle`], which is
//! either `Unconfigured` (no credentials, a standing degraded state) or
//! `Ready` with a shared backend.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};
use types::record::EarthquakeRecord;

use crate::error::{StoreError, StoreResult};
use crate::query::QueryService;

// ── Query types ─────────────────────────────────────────────────────

/// Default page size for list queries.
pub const DEFAULT_PAGE_LIMIT: usize = 50;

/// Hard cap on page size.
pub const MAX_PAGE_LIMIT: usize = 1000;

/// Paginated list request. Magnitude bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ListQuery {
    pub limit: usize,
    pub offset: usize,
    pub min_magnitude: Option<f64>,
    pub max_magnitude: Option<f64>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_LIMIT,
            offset: 0,
            min_magnitude: None,
            max_magnitude: None,
        }
    }
}

/// One page of records, most recent first, with the filtered total.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub records: Vec<EarthquakeRecord>,
    pub total: u64,
}

// ── Store trait ─────────────────────────────────────────────────────

#[async_trait]
pub trait EarthquakeStore: Send + Sync {
    /// Short backend name for logs and health output.
    fn backend(&self) -> &'static str;

    /// Insert or fully replace the record with the same id.
    ///
    /// `created_at` of an existing record is preserved.
    async fn upsert(&self, record: &EarthquakeRecord) -> StoreResult<()>;

    /// Upsert many records; returns how many distinct ids were written.
    ///
    /// Repeated ids collapse to their last occurrence. Not atomic.
    /// Failures are logged and lower the count; they never propagate.
    async fn upsert_batch(&self, records: &[EarthquakeRecord]) -> usize {
        let unique = dedupe_last_wins(records);
        let mut written = 0;
        for record in unique {
            match self.upsert(record).await {
                Ok(()) => written += 1,
                Err(e) => warn!(id = %record.id, error = %e, "Upsert failed"),
            }
        }
        debug!(backend = self.backend(), written, total = records.len(), "Batch upsert finished");
        written
    }

    async fn get(&self, id: &str) -> StoreResult<Option<EarthquakeRecord>>;

    /// Most recent record by event timestamp.
    async fn latest(&self) -> StoreResult<Option<EarthquakeRecord>>;

    async fn page(&self, query: &ListQuery) -> StoreResult<Page>;

    /// Every stored record, in no particular order.
    async fn all(&self) -> StoreResult<Vec<EarthquakeRecord>>;
}

/// Keep the last occurrence of each id, preserving first-seen order.
pub(crate) fn dedupe_last_wins(records: &[EarthquakeRecord]) -> Vec<&EarthquakeRecord> {
    let mut slot: BTreeMap<&str, usize> = BTreeMap::new();
    let mut out: Vec<&EarthquakeRecord> = Vec::with_capacity(records.len());
    for r in records {
        match slot.get(r.id.as_str()) {
            Some(&i) => out[i] = r,
            None => {
                slot.insert(r.id.as_str(), out.len());
                out.push(r);
            }
        }
    }
    out
}

// ── Handle ──────────────────────────────────────────────────────────

/// Store availability, passed to every component that needs storage.
#[derive(Clone)]
pub enum StoreHandle {
    /// No storage credentials: ingestion disabled, queries unavailable.
    Unconfigured,
    Ready(Arc<dyn EarthquakeStore>),
}

impl StoreHandle {
    pub fn ready(store: impl EarthquakeStore + 'static) -> Self {
        StoreHandle::Ready(Arc::new(store))
    }

    pub fn is_configured(&self) -> bool {
        matches!(self, StoreHandle::Ready(_))
    }

    /// The backend, or `StoreError::Unconfigured`.
    pub fn store(&self) -> StoreResult<Arc<dyn EarthquakeStore>> {
        match self {
            StoreHandle::Ready(store) => Ok(Arc::clone(store)),
            StoreHandle::Unconfigured => Err(StoreError::Unconfigured),
        }
    }

    /// Read-side service over the backend, or `StoreError::Unconfigured`.
    pub fn query(&self) -> StoreResult<QueryService> {
        self.store().map(QueryService::new)
    }

    /// Backend name, or "unconfigured".
    pub fn mode(&self) -> &'static str {
        match self {
            StoreHandle::Ready(store) => store.backend(),
            StoreHandle::Unconfigured => "unconfigured",
        }
    }
}

impl std::fmt::Debug for StoreHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StoreHandle({})", self.mode())
    }
}
