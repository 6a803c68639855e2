//! Read-side projections over the store
//!
//! Nearby and stats scan every stored record and compute in memory; there
//! is no spatial index or pre-aggregated counter.

use std::sync::Arc;

use tracing::debug;
use types::geo::{within_radius, GeoPoint};
use types::record::{EarthquakeRecord, NearbyRecord};
use types::stats::EarthquakeStats;

use crate::error::StoreResult;
use crate::store::{EarthquakeStore, ListQuery, Page, MAX_PAGE_LIMIT};

#[derive(Clone)]
pub struct QueryService {
    store: Arc<dyn EarthquakeStore>,
}

impl QueryService {
    pub fn new(store: Arc<dyn EarthquakeStore>) -> Self {
        Self { store }
    }

    /// Page ordered by timestamp descending. `limit` is clamped to
    /// `1..=MAX_PAGE_LIMIT`.
    pub async fn list(&self, query: ListQuery) -> StoreResult<Page> {
        let query = ListQuery {
            limit: query.limit.clamp(1, MAX_PAGE_LIMIT),
            ..query
        };
        self.store.page(&query).await
    }

    pub async fn latest(&self) -> StoreResult<Option<EarthquakeRecord>> {
        self.store.latest().await
    }

    pub async fn get(&self, id: &str) -> StoreResult<Option<EarthquakeRecord>> {
        self.store.get(id).await
    }

    /// Every record within `radius_km` of `center`, nearest first.
    pub async fn nearby(&self, center: GeoPoint, radius_km: f64) -> StoreResult<Vec<NearbyRecord>> {
        let records = self.store.all().await?;
        let hits = within_radius(&records, center, radius_km);
        debug!(scanned = records.len(), hits = hits.len(), radius_km, "Nearby scan");
        Ok(hits)
    }

    /// Summary statistics; `day_start` is Unix millis of local midnight.
    pub async fn stats(&self, day_start: i64) -> StoreResult<EarthquakeStats> {
        let records = self.store.all().await?;
        Ok(EarthquakeStats::compute(&records, day_start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use types::ids::EventId;

    fn record(id: &str, timestamp: i64, magnitude: f64, latitude: f64, longitude: f64) -> EarthquakeRecord {
        EarthquakeRecord {
            id: EventId::from_raw(id),
            datetime: "15 Jan 2024 10:21:45 WIB".to_string(),
            timestamp,
            magnitude,
            depth: 10.0,
            latitude,
            longitude,
            region: "Laut Banda".to_string(),
            tsunami_potential: None,
            felt_status: None,
            shakemap_url: None,
            created_at: 0,
        }
    }

    async fn service(records: Vec<EarthquakeRecord>) -> QueryService {
        let store = MemoryStore::new();
        store.upsert_batch(&records).await;
        QueryService::new(Arc::new(store))
    }

    #[tokio::test]
    async fn test_list_clamps_limit() {
        let svc = service(vec![record("a", 1, 5.0, 0.0, 0.0), record("b", 2, 5.0, 0.0, 0.0)]).await;
        let page = svc.list(ListQuery { limit: 0, ..ListQuery::default() }).await.unwrap();
        assert_eq!(page.records.len(), 1);
        assert_eq!(page.records[0].id.as_str(), "b");
        assert_eq!(page.total, 2);
    }

    #[tokio::test]
    async fn test_nearby() {
        let svc = service(vec![
            record("ambon", 1, 5.0, -3.70, 128.18),
            record("jakarta", 2, 5.0, -6.21, 106.85),
        ])
        .await;
        let hits = svc.nearby(GeoPoint::new(-3.65, 128.20), 100.0).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].record.id.as_str(), "ambon");
        assert!(hits[0].distance < 10.0);
    }

    #[tokio::test]
    async fn test_stats_histogram() {
        let magnitudes = [3.0, 5.0, 5.9, 6.0, 7.5];
        let records = magnitudes
            .iter()
            .enumerate()
            .map(|(i, m)| record(&format!("r{i}"), i as i64, *m, 0.0, 0.0))
            .collect();
        let svc = service(records).await;

        let stats = svc.stats(3).await.unwrap();
        assert_eq!(stats.total, 5);
        assert_eq!(stats.today, 2);
        assert_eq!(stats.strongest.unwrap().magnitude, 7.5);
        let d = stats.magnitude_distribution;
        assert_eq!((d.below_5, d.from_5_to_6, d.from_6_to_7, d.above_7), (1, 2, 1, 1));
    }

    #[tokio::test]
    async fn test_get_missing() {
        let svc = service(vec![]).await;
        assert!(svc.get("nope").await.unwrap().is_none());
        assert!(svc.latest().await.unwrap().is_none());
    }
}
