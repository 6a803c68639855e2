//! Great-circle distance and radius filtering
//!
//! Distances use the haversine formula on a spherical Earth of radius
//! 6371 km. Radius search is a full scan over the records it is given.

use crate::record::{EarthquakeRecord, NearbyRecord};
use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Default search radius for nearby queries.
pub const DEFAULT_RADIUS_KM: f64 = 100.0;

/// A WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Haversine distance to `other` in km.
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        let d_lat = (other.latitude - self.latitude).to_radians();
        let d_lon = (other.longitude - self.longitude).to_radians();
        let a = (d_lat / 2.0).sin().powi(2)
            + self.latitude.to_radians().cos()
                * other.latitude.to_radians().cos()
                * (d_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_KM * c
    }
}

impl From<&EarthquakeRecord> for GeoPoint {
    fn from(record: &EarthquakeRecord) -> Self {
        Self::new(record.latitude, record.longitude)
    }
}

/// Round to one decimal place.
pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Select every record within `radius_km` of `center` (boundary inclusive),
/// annotated with its rounded distance, nearest first.
///
/// The boundary test uses the unrounded distance.
pub fn within_radius<'a, I>(records: I, center: GeoPoint, radius_km: f64) -> Vec<NearbyRecord>
where
    I: IntoIterator<Item = &'a EarthquakeRecord>,
{
    let mut hits: Vec<(f64, &EarthquakeRecord)> = records
        .into_iter()
        .map(|r| (center.distance_km(&GeoPoint::from(r)), r))
        .filter(|(d, _)| *d <= radius_km)
        .collect();

    hits.sort_by(|(da, ra), (db, rb)| da.total_cmp(db).then_with(|| ra.id.cmp(&rb.id)));

    hits.into_iter()
        .map(|(d, r)| NearbyRecord {
            record: r.clone(),
            distance: round_to_tenth(d),
        })
        .collect()
}
