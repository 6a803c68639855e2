use axum::{Json, extract::State};

use crate::models::{ApiResponse, Health};
use crate::state::AppState;

/// Liveness; answers 200 whether or not storage is configured.
pub async fn health(State(state): State<AppState>) -> Json<ApiResponse<Health>> {
    Json(ApiResponse::ok(Health {
        status: "ok",
        store: state.store.mode(),
        version: env!("CARGO_PKG_VERSION"),
    }))
}
