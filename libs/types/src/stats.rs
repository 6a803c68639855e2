//! Aggregate statistics over stored records
//!
//! Magnitudes fall into four half-open buckets:
//! `[0, 5)`, `[5, 6)`, `[6, 7)`, `[7, ∞)`.

use crate::record::EarthquakeRecord;
use serde::{Deserialize, Serialize};

/// Magnitude bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MagnitudeBucket {
    Below5,
    From5To6,
    From6To7,
    Above7,
}

impl MagnitudeBucket {
    pub fn of(magnitude: f64) -> Self {
        if magnitude < 5.0 {
            MagnitudeBucket::Below5
        } else if magnitude < 6.0 {
            MagnitudeBucket::From5To6
        } else if magnitude < 7.0 {
            MagnitudeBucket::From6To7
        } else {
            MagnitudeBucket::Above7
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MagnitudeBucket::Below5 => "<5",
            MagnitudeBucket::From5To6 => "5-6",
            MagnitudeBucket::From6To7 => "6-7",
            MagnitudeBucket::Above7 => "7+",
        }
    }
}

/// Count of records per magnitude bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MagnitudeDistribution {
    #[serde(rename = "<5")]
    pub below_5: u64,
    #[serde(rename = "5-6")]
    pub from_5_to_6: u64,
    #[serde(rename = "6-7")]
    pub from_6_to_7: u64,
    #[serde(rename = "7+")]
    pub above_7: u64,
}

impl MagnitudeDistribution {
    pub fn record(&mut self, magnitude: f64) {
        match MagnitudeBucket::of(magnitude) {
            MagnitudeBucket::Below5 => self.below_5 += 1,
            MagnitudeBucket::From5To6 => self.from_5_to_6 += 1,
            MagnitudeBucket::From6To7 => self.from_6_to_7 += 1,
            MagnitudeBucket::Above7 => self.above_7 += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.below_5 + self.from_5_to_6 + self.from_6_to_7 + self.above_7
    }
}

impl FromIterator<f64> for MagnitudeDistribution {
    fn from_iter<T: IntoIterator<Item = f64>>(iter: T) -> Self {
        let mut dist = MagnitudeDistribution::default();
        for m in iter {
            dist.record(m);
        }
        dist
    }
}

/// Summary returned by the stats endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarthquakeStats {
    pub total: u64,
    /// Records with `timestamp >= day_start`
    pub today: u64,
    pub strongest: Option<EarthquakeRecord>,
    pub magnitude_distribution: MagnitudeDistribution,
}

impl EarthquakeStats {
    /// Single pass over `records`. `day_start` is Unix millis of local midnight.
    ///
    /// Ties for strongest go to the most recent record.
    pub fn compute<'a, I>(records: I, day_start: i64) -> Self
    where
        I: IntoIterator<Item = &'a EarthquakeRecord>,
    {
        let mut total = 0;
        let mut today = 0;
        let mut strongest: Option<&EarthquakeRecord> = None;
        let mut dist = MagnitudeDistribution::default();

        for r in records {
            total += 1;
            if r.timestamp >= day_start {
                today += 1;
            }
            dist.record(r.magnitude);
            strongest = match strongest {
                Some(s)
                    if s.magnitude > r.magnitude
                        || (s.magnitude == r.magnitude && s.timestamp >= r.timestamp) =>
                {
                    Some(s)
                }
                _ => Some(r),
            };
        }

        Self {
            total,
            today,
            strongest: strongest.cloned(),
            magnitude_distribution: dist,
        }
    }
}
