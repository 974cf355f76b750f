use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use geodemand_core::models::DaySummary;

use crate::dto::{BackgroundRunResponse, RecomputeRequest, RecomputeResponse};
use crate::error::ApiError;
use crate::services::parse_date;
use crate::state::AppState;

/// Recompute `[start, end)` and wait for the result.
///
/// A day failure answers 500 with the report of the days that did complete.
pub async fn recompute_range(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RecomputeRequest>,
) -> Result<(StatusCode, Json<RecomputeResponse>), ApiError> {
    tracing::info!(start = %request.start, end = %request.end, "Range recompute requested");

    let report = state.orchestrator.run_range(request.start, request.end).await?;
    let status =
        if report.is_success() { StatusCode::OK } else { StatusCode::INTERNAL_SERVER_ERROR };

    Ok((status, Json(report.into())))
}

pub async fn recompute_date(
    State(state): State<Arc<AppState>>,
    Path(date): Path<String>,
) -> Result<Json<DaySummary>, ApiError> {
    let date = parse_date(&date)?;
    tracing::info!(%date, "Recompute requested");

    let summary = state.orchestrator.run_one(date).await?;
    Ok(Json(summary))
}

/// Start a recompute and return its run id without waiting (202 Accepted)
pub async fn recompute_date_background(
    State(state): State<Arc<AppState>>,
    Path(date): Path<String>,
) -> Result<(StatusCode, Json<BackgroundRunResponse>), ApiError> {
    let date = parse_date(&date)?;

    let run_id = state.orchestrator.spawn_one(date).await?;
    tracing::info!(%date, %run_id, "Background recompute started");

    Ok((StatusCode::ACCEPTED, Json(BackgroundRunResponse::accepted(run_id))))
}
