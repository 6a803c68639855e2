//! Stable identifiers for earthquake events
//!
//! An event id is derived from the source event time and the parsed
//! epicentre, so the same physical event reported by several feeds always
//! collapses to the same storage key.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a single earthquake event.
///
/// Format: `{source_datetime}_{latitude}_{longitude}` with every `:` and
/// every whitespace character replaced by `_`, e.g.
/// `2024-01-15T03_21_45+00_00_-3.21_128.45`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    /// Derive the id for an event.
    ///
    /// Coordinates are rendered with `f64`'s shortest round-trip `Display`,
    /// so the result depends only on the inputs (no locale, no clock).
    pub fn derive(source_datetime: &str, latitude: f64, longitude: f64) -> Self {
        let raw = format!("{}_{}_{}", source_datetime.trim(), latitude, longitude);
        Self(sanitize(&raw))
    }

    /// Wrap an id received from a caller (path segment, database row).
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for EventId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Replace characters that are unsafe in a storage key or URL path segment.
fn sanitize(raw: &str) -> String {
    raw.chars()
        .map(|c| if c == ':' || c.is_whitespace() { '_' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_event_id_format() {
        let id = EventId::derive("2024-01-15T03:21:45+00:00", -3.21, 128.45);
        assert_eq!(id.as_str(), "2024-01-15T03_21_45+00_00_-3.21_128.45");
    }

    #[test]
    fn test_event_id_integral_coordinates() {
        let id = EventId::derive("2024-01-15T03:21:45+00:00", -3.0, 128.0);
        assert_eq!(id.as_str(), "2024-01-15T03_21_45+00_00_-3_128");
    }

    #[test]
    fn test_event_id_replaces_whitespace() {
        let id = EventId::derive("15 Jan 2024\t03:21:45", 1.5, 2.5);
        assert_eq!(id.as_str(), "15_Jan_2024_03_21_45_1.5_2.5");
    }

    #[test]
    fn test_event_id_serialization() {
        let id = EventId::derive("2024-01-15T03:21:45+00:00", -3.21, 128.45);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"2024-01-15T03_21_45+00_00_-3.21_128.45\"");
        let back: EventId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }

    proptest! {
        #[test]
        fn prop_derive_is_deterministic(
            dt in "[0-9T:+ -]{1,32}",
            lat in -90.0f64..90.0,
            lon in -180.0f64..180.0,
        ) {
            let a = EventId::derive(&dt, lat, lon);
            let b = EventId::derive(&dt, lat, lon);
            prop_assert_eq!(&a, &b);
            prop_assert!(!a.as_str().contains(':'));
            prop_assert!(!a.as_str().chars().any(char::is_whitespace));
        }
    }
}
