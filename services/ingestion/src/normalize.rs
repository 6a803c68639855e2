//! Ingestion normalizer
//!
//! Pure transformation from a raw feed entry to an `EarthquakeRecord`.
//! Every numeric field arrives as a string; any parse failure rejects
//! that one entry and leaves its siblings alone.
//!
//! The event id is derived from the source `DateTime` and the parsed
//! coordinates only, so the same event reported by several feeds maps to
//! the same key.

use chrono::DateTime;
use tracing::debug;
use types::ids::EventId;
use types::record::EarthquakeRecord;

use crate::feed::RawEntry;

// ── Errors ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NormalizeError {
    #[error("invalid coordinates {0:?}: expected \"lat,lon\"")]
    Coordinates(String),

    #[error("invalid magnitude {0:?}")]
    Magnitude(String),

    #[error("invalid depth {0:?}")]
    Depth(String),

    #[error("invalid event time {0:?}")]
    EventTime(String),

    #[error("malformed entry: {0}")]
    Shape(String),
}

// ── Batch result ────────────────────────────────────────────────────

/// Outcome of normalizing one feed's entries.
#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    pub records: Vec<EarthquakeRecord>,
    /// Index of the rejected entry in the input and why it was rejected
    pub rejected: Vec<(usize, NormalizeError)>,
}

// ── Normalizer ──────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Normalizer {
    /// Origin that relative shakemap paths are resolved against
    shakemap_base: String,
}

impl Normalizer {
    pub fn new(shakemap_base: impl Into<String>) -> Self {
        Self {
            shakemap_base: shakemap_base.into().trim_end_matches('/').to_string(),
        }
    }

    /// Normalize one entry. `created_at` is the ingestion wall-clock time.
    pub fn normalize(&self, entry: &RawEntry, created_at: i64) -> Result<EarthquakeRecord, NormalizeError> {
        if let Some(e) = &entry.decode_error {
            return Err(NormalizeError::Shape(e.clone()));
        }
        let (latitude, longitude) = parse_coordinates(&entry.coordinates)?;
        let magnitude = parse_magnitude(&entry.magnitude)?;
        let depth = parse_depth(&entry.depth)?;
        let timestamp = parse_event_time(&entry.datetime)?;

        Ok(EarthquakeRecord {
            id: EventId::derive(&entry.datetime, latitude, longitude),
            datetime: format!("{} {}", entry.date.trim(), entry.time.trim()),
            timestamp,
            magnitude,
            depth,
            latitude,
            longitude,
            region: entry.region.trim().to_string(),
            tsunami_potential: non_empty(entry.tsunami_potential.as_deref()),
            felt_status: non_empty(entry.felt_status.as_deref()),
            shakemap_url: non_empty(entry.shakemap.as_deref()).map(|p| self.resolve_shakemap(&p)),
            created_at,
        })
    }

    /// Normalize a feed's entries, collecting rejects instead of failing.
    pub fn normalize_batch(&self, entries: &[RawEntry], created_at: i64) -> NormalizedBatch {
        let mut batch = NormalizedBatch::default();
        for (idx, entry) in entries.iter().enumerate() {
            match self.normalize(entry, created_at) {
                Ok(record) => batch.records.push(record),
                Err(e) => {
                    debug!(index = idx, error = %e, "Entry rejected");
                    batch.rejected.push((idx, e));
                }
            }
        }
        batch
    }

    fn resolve_shakemap(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}/{}", self.shakemap_base, path.trim_start_matches('/'))
        }
    }
}

// ── Field parsers ───────────────────────────────────────────────────

fn parse_finite(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// "lat,lon" → (lat, lon), WGS84 ranges enforced.
fn parse_coordinates(raw: &str) -> Result<(f64, f64), NormalizeError> {
    let err = || NormalizeError::Coordinates(raw.to_string());
    let mut parts = raw.split(',');
    let (lat, lon) = match (parts.next(), parts.next(), parts.next()) {
        (Some(lat), Some(lon), None) => (lat, lon),
        _ => return Err(err()),
    };
    let lat = parse_finite(lat).ok_or_else(err)?;
    let lon = parse_finite(lon).ok_or_else(err)?;
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return Err(err());
    }
    Ok((lat, lon))
}

fn parse_magnitude(raw: &str) -> Result<f64, NormalizeError> {
    parse_finite(raw)
        .filter(|m| *m >= 0.0)
        .ok_or_else(|| NormalizeError::Magnitude(raw.to_string()))
}

/// "10 km" → 10.0. The unit is optional and case-insensitive.
fn parse_depth(raw: &str) -> Result<f64, NormalizeError> {
    let lower = raw.trim().to_ascii_lowercase();
    let number = lower.strip_suffix("km").unwrap_or(&lower);
    parse_finite(number).ok_or_else(|| NormalizeError::Depth(raw.to_string()))
}

/// RFC 3339 → Unix millis.
fn parse_event_time(raw: &str) -> Result<i64, NormalizeError> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|dt| dt.timestamp_millis())
        .map_err(|_| NormalizeError::EventTime(raw.to_string()))
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}
