use axum::{Json, extract::State};
use ingestion::{CycleReport, TriggerOutcome};
use persistence::StoreError;
use serde::Serialize;

use crate::error::AppError;
use crate::models::{ApiResponse, Skipped};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum RefreshResult {
    Completed(CycleReport),
    Skipped(Skipped),
}

/// Run one ingestion cycle now through the scheduler's single-flight guard.
pub async fn refresh(State(state): State<AppState>) -> Result<Json<ApiResponse<RefreshResult>>, AppError> {
    let scheduler = state
        .scheduler
        .as_ref()
        .ok_or(AppError::from(StoreError::Unconfigured))?;

    let result = match scheduler.trigger().await {
        TriggerOutcome::Completed(report) => RefreshResult::Completed(report),
        TriggerOutcome::Skipped => RefreshResult::Skipped(Skipped { skipped: true }),
    };
    Ok(Json(ApiResponse::ok(result)))
}
