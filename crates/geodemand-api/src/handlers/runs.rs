use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use geodemand_core::models::{RunId, RunRecord};
use uuid::Uuid;

use crate::dto::RunsQuery;
use crate::error::ApiError;
use crate::state::AppState;

const MAX_RUNS: usize = 100;

pub async fn list_runs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RunsQuery>,
) -> Result<Json<Vec<RunRecord>>, ApiError> {
    let limit = query.limit.clamp(1, MAX_RUNS);
    let runs = state.stores().runs.recent_runs(limit).await?;
    Ok(Json(runs))
}

pub async fn get_run(
    State(state): State<Arc<AppState>>,
    Path(run_id): Path<String>,
) -> Result<Json<RunRecord>, ApiError> {
    let run_id = Uuid::parse_str(&run_id)
        .map(RunId)
        .map_err(|_| ApiError::bad_request("Invalid run ID format"))?;

    state
        .stores()
        .runs
        .get_run(run_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Run not found").with_details(run_id.to_string()))
}
