use crate::handlers::{earthquakes, health, ingest};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn create_router(state: AppState) -> Router {
    // Static segments win over the `{id}` capture.
    let earthquake_routes = Router::new()
        .route("/earthquakes", get(earthquakes::list_earthquakes))
        .route("/earthquakes/latest", get(earthquakes::latest_earthquake))
        .route("/earthquakes/nearby", get(earthquakes::nearby_earthquakes))
        .route("/earthquakes/stats", get(earthquakes::earthquake_stats))
        .route("/earthquakes/refresh", post(ingest::refresh))
        .route("/earthquakes/{id}", get(earthquakes::get_earthquake));

    Router::new()
        .route("/health", get(health::health))
        .merge(earthquake_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
