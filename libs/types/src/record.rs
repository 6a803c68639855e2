//! Canonical earthquake record
//!
//! The normalized, deduplicated representation used for storage and
//! querying. One record per physical event, keyed by [`EventId`].

use crate::ids::EventId;
use serde::{Deserialize, Serialize};

/// Canonical earthquake record.
///
/// Records are replaced whole under the same `id`; `created_at` is the
/// ingestion time of the first write and survives replacement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarthquakeRecord {
    pub id: EventId,
    /// Human-readable local date and time, display only
    pub datetime: String,
    /// Event time, Unix millis
    pub timestamp: i64,
    pub magnitude: f64,
    /// Hypocentre depth in km
    pub depth: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub region: String,
    pub tsunami_potential: Option<String>,
    pub felt_status: Option<String>,
    pub shakemap_url: Option<String>,
    /// Ingestion time, Unix millis
    pub created_at: i64,
}

impl EarthquakeRecord {
    /// Whether the magnitude lies inside the optional inclusive bounds.
    pub fn magnitude_within(&self, min: Option<f64>, max: Option<f64>) -> bool {
        min.map_or(true, |m| self.magnitude >= m) && max.map_or(true, |m| self.magnitude <= m)
    }
}

/// A record annotated with its distance from a query point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearbyRecord {
    #[serde(flatten)]
    pub record: EarthquakeRecord,
    /// Great-circle distance in km, rounded to one decimal
    pub distance: f64,
}

/// Ordering used by every "most recent first" listing: timestamp
/// descending, ties broken by id so pages are stable.
pub fn recency_order(a: &EarthquakeRecord, b: &EarthquakeRecord) -> std::cmp::Ordering {
    b.timestamp
        .cmp(&a.timestamp)
        .then_with(|| a.id.cmp(&b.id))
}
