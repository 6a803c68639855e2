//! Read-only earthquake routes.
//!
//! Every handler resolves the store before looking at its parameters, so
//! an unconfigured deployment answers 503 even to malformed requests.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use persistence::QueryService;
use types::record::{EarthquakeRecord, NearbyRecord};
use types::stats::EarthquakeStats;
use types::time::local_day_start_millis;

use crate::error::AppError;
use crate::models::{ApiResponse, ListParams, NearbyParams, Pagination};
use crate::state::AppState;

type ApiResult<T> = Result<Json<ApiResponse<T>>, AppError>;

fn query_service(state: &AppState) -> Result<QueryService, AppError> {
    Ok(state.store.query()?)
}

pub async fn list_earthquakes(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Vec<EarthquakeRecord>> {
    let service = query_service(&state)?;
    let query = params.to_query()?;

    let page = service.list(query).await?;
    let pagination = Pagination {
        total: page.total,
        limit: query.limit,
        offset: query.offset,
    };
    Ok(Json(ApiResponse::paginated(page.records, pagination)))
}

pub async fn latest_earthquake(State(state): State<AppState>) -> ApiResult<EarthquakeRecord> {
    let service = query_service(&state)?;
    let record = service
        .latest()
        .await?
        .ok_or_else(|| AppError::NotFound("No earthquake data available".to_string()))?;
    Ok(Json(ApiResponse::ok(record)))
}

pub async fn nearby_earthquakes(
    State(state): State<AppState>,
    Query(params): Query<NearbyParams>,
) -> ApiResult<Vec<NearbyRecord>> {
    let service = query_service(&state)?;
    let (center, radius) = params.to_search()?;
    Ok(Json(ApiResponse::ok(service.nearby(center, radius).await?)))
}

pub async fn earthquake_stats(State(state): State<AppState>) -> ApiResult<EarthquakeStats> {
    let service = query_service(&state)?;
    let stats = service.stats(local_day_start_millis()).await?;
    Ok(Json(ApiResponse::ok(stats)))
}

pub async fn get_earthquake(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<EarthquakeRecord> {
    let service = query_service(&state)?;
    let record = service
        .get(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Earthquake {id} not found")))?;
    Ok(Json(ApiResponse::ok(record)))
}
