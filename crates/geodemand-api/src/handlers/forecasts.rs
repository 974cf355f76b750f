use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use geodemand_core::models::Recommendation;
use geojson::FeatureCollection;

use crate::dto::DateQuery;
use crate::error::ApiError;
use crate::services::ForecastService;
use crate::state::AppState;

pub async fn get_zones(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DateQuery>,
) -> Result<Json<FeatureCollection>, ApiError> {
    let date = ForecastService::resolve_date(&state, query.date.as_deref())?;
    tracing::debug!(%date, "Reading zones");

    Ok(Json(ForecastService::zones(&state, date).await?))
}

pub async fn get_heatmap(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DateQuery>,
) -> Result<Json<FeatureCollection>, ApiError> {
    let date = ForecastService::resolve_date(&state, query.date.as_deref())?;
    tracing::debug!(%date, "Reading heatmap");

    Ok(Json(ForecastService::heatmap(&state, date).await?))
}

pub async fn get_recommendations(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DateQuery>,
) -> Result<Json<Vec<Recommendation>>, ApiError> {
    let date = ForecastService::resolve_date(&state, query.date.as_deref())?;
    tracing::debug!(%date, "Reading recommendations");

    Ok(Json(ForecastService::recommendations(&state, date).await?))
}
