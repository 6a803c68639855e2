use std::str::FromStr;

use persistence::store::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use persistence::ListQuery;
use serde::{Deserialize, Serialize};
use types::geo::{DEFAULT_RADIUS_KM, GeoPoint};

use crate::error::AppError;

// ── Response envelope ───────────────────────────────────────────────

/// `{ success, data?, error?, pagination? }`
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            pagination: None,
        }
    }

    pub fn paginated(data: T, pagination: Pagination) -> Self {
        Self {
            pagination: Some(pagination),
            ..Self::ok(data)
        }
    }

    pub fn failure(error: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            pagination: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Pagination {
    pub total: u64,
    pub limit: usize,
    pub offset: usize,
}

// ── Query parameters ────────────────────────────────────────────────
//
// Values arrive as raw strings and are parsed here so a malformed number
// produces the JSON error envelope instead of axum's plain-text rejection.

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub limit: Option<String>,
    pub offset: Option<String>,
    pub min_magnitude: Option<String>,
    pub max_magnitude: Option<String>,
}

impl ListParams {
    /// Limit is clamped to `1..=MAX_PAGE_LIMIT`; offset must be non-negative.
    pub fn to_query(&self) -> Result<ListQuery, AppError> {
        let limit = parse::<i64>("limit", self.limit.as_deref())?
            .map(|l| l.clamp(1, MAX_PAGE_LIMIT as i64) as usize)
            .unwrap_or(DEFAULT_PAGE_LIMIT);
        let offset = match parse::<i64>("offset", self.offset.as_deref())? {
            None => 0,
            Some(o) if o < 0 => {
                return Err(AppError::BadRequest("offset must not be negative".to_string()));
            }
            Some(o) => usize::try_from(o)
                .map_err(|_| AppError::BadRequest(format!("offset {o} is out of range")))?,
        };
        let min_magnitude = parse_finite("minMagnitude", self.min_magnitude.as_deref())?;
        let max_magnitude = parse_finite("maxMagnitude", self.max_magnitude.as_deref())?;

        Ok(ListQuery {
            limit,
            offset,
            min_magnitude,
            max_magnitude,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NearbyParams {
    pub lat: Option<String>,
    pub lng: Option<String>,
    pub radius: Option<String>,
}

impl NearbyParams {
    /// Center point and radius in km. `lat` and `lng` are required.
    pub fn to_search(&self) -> Result<(GeoPoint, f64), AppError> {
        let (Some(lat), Some(lng)) = (
            parse_finite("lat", self.lat.as_deref())?,
            parse_finite("lng", self.lng.as_deref())?,
        ) else {
            return Err(AppError::BadRequest(
                "lat and lng query parameters are required".to_string(),
            ));
        };
        if !(-90.0..=90.0).contains(&lat) {
            return Err(AppError::BadRequest("lat must be between -90 and 90".to_string()));
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(AppError::BadRequest("lng must be between -180 and 180".to_string()));
        }

        let radius = parse_finite("radius", self.radius.as_deref())?.unwrap_or(DEFAULT_RADIUS_KM);
        if radius < 0.0 {
            return Err(AppError::BadRequest("radius must not be negative".to_string()));
        }
        Ok((GeoPoint::new(lat, lng), radius))
    }
}

/// `{ "skipped": true }` when a refresh found a cycle already running.
#[derive(Debug, Clone, Serialize)]
pub struct Skipped {
    pub skipped: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub store: &'static str,
    pub version: &'static str,
}

fn parse<T: FromStr>(name: &str, raw: Option<&str>) -> Result<Option<T>, AppError> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| AppError::BadRequest(format!("{name} must be a number, got {value:?}"))),
    }
}

fn parse_finite(name: &str, raw: Option<&str>) -> Result<Option<f64>, AppError> {
    match parse::<f64>(name, raw)? {
        Some(v) if !v.is_finite() => Err(AppError::BadRequest(format!("{name} must be a finite number"))),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(limit: Option<&str>, offset: Option<&str>) -> ListParams {
        ListParams {
            limit: limit.map(str::to_string),
            offset: offset.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_list_defaults() {
        let q = ListParams::default().to_query().unwrap();
        assert_eq!(q, ListQuery::default());
    }

    #[test]
    fn test_limit_is_clamped() {
        assert_eq!(list(Some("5000"), None).to_query().unwrap().limit, 1000);
        assert_eq!(list(Some("0"), None).to_query().unwrap().limit, 1);
        assert_eq!(list(Some("-3"), None).to_query().unwrap().limit, 1);
        assert_eq!(list(Some("20"), Some("40")).to_query().unwrap().offset, 40);
    }

    #[test]
    fn test_malformed_numbers_rejected() {
        assert!(matches!(list(Some("abc"), None).to_query(), Err(AppError::BadRequest(_))));
        assert!(list(None, Some("-1")).to_query().is_err());
        assert!(matches!(
            list(None, Some("18446744073709551615")).to_query(),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            list(None, Some("9223372036854775808")).to_query(),
            Err(AppError::BadRequest(_))
        ));
        let params = ListParams {
            min_magnitude: Some("NaN".to_string()),
            ..Default::default()
        };
        assert!(params.to_query().is_err());
    }

    #[test]
    fn test_magnitude_bounds_parsed() {
        let params = ListParams {
            min_magnitude: Some("5".to_string()),
            max_magnitude: Some("6.5".to_string()),
            ..Default::default()
        };
        let q = params.to_query().unwrap();
        assert_eq!((q.min_magnitude, q.max_magnitude), (Some(5.0), Some(6.5)));
    }

    #[test]
    fn test_nearby_requires_lat_lng() {
        let params = NearbyParams {
            lng: Some("128.0".to_string()),
            ..Default::default()
        };
        assert!(matches!(params.to_search(), Err(AppError::BadRequest(_))));

        let params = NearbyParams {
            lat: Some("north".to_string()),
            lng: Some("128.0".to_string()),
            ..Default::default()
        };
        assert!(matches!(params.to_search(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_nearby_defaults_radius() {
        let params = NearbyParams {
            lat: Some("-3.2".to_string()),
            lng: Some("128.4".to_string()),
            radius: None,
        };
        let (center, radius) = params.to_search().unwrap();
        assert_eq!(center, GeoPoint::new(-3.2, 128.4));
        assert_eq!(radius, 100.0);
    }

    #[test]
    fn test_envelope_shape() {
        let ok = serde_json::to_value(ApiResponse::ok(1)).unwrap();
        assert_eq!(ok, serde_json::json!({"success": true, "data": 1}));

        let err = serde_json::to_value(ApiResponse::<()>::failure("nope".to_string())).unwrap();
        assert_eq!(err, serde_json::json!({"success": false, "error": "nope"}));
    }
}
