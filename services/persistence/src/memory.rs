//! In-memory backend
//!
//! A `BTreeMap` keyed by event id behind a `tokio::sync::RwLock`. Readers
//! never observe a half-written record; nothing survives a restart.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use types::record::{recency_order, EarthquakeRecord};

use crate::error::StoreResult;
use crate::store::{EarthquakeStore, ListQuery, Page};

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<BTreeMap<String, EarthquakeRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl EarthquakeStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn upsert(&self, record: &EarthquakeRecord) -> StoreResult<()> {
        let mut records = self.records.write().await;
        let mut next = record.clone();
        if let Some(existing) = records.get(record.id.as_str()) {
            next.created_at = existing.created_at;
        }
        records.insert(record.id.to_string(), next);
        Ok(())
    }

    async fn get(&self, id: &str) -> StoreResult<Option<EarthquakeRecord>> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn latest(&self) -> StoreResult<Option<EarthquakeRecord>> {
        let records = self.records.read().await;
        Ok(records.values().min_by(|a, b| recency_order(a, b)).cloned())
    }

    async fn page(&self, query: &ListQuery) -> StoreResult<Page> {
        let records = self.records.read().await;
        let mut matching: Vec<&EarthquakeRecord> = records
            .values()
            .filter(|r| r.magnitude_within(query.min_magnitude, query.max_magnitude))
            .collect();
        matching.sort_by(|a, b| recency_order(a, b));

        let total = matching.len() as u64;
        let records = matching
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .cloned()
            .collect();

        Ok(Page { records, total })
    }

    async fn all(&self) -> StoreResult<Vec<EarthquakeRecord>> {
        Ok(self.records.read().await.values().cloned().collect())
    }
}
