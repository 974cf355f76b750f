use chrono::NaiveDate;
use geodemand_core::models::{HourlyPrediction, Recommendation, ZoneId, ZoneWithPredictions};
use geodemand_geo::features::{heatmap_collection, zone_collection};
use geojson::FeatureCollection;
use std::collections::HashMap;

use crate::error::ApiError;
use crate::state::AppState;

/// Parse a `YYYY-MM-DD` path or query value
pub fn parse_date(value: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        ApiError::bad_request("Invalid date").with_details(format!("'{}' is not YYYY-MM-DD", value))
    })
}

/// Read side of the stored forecasts
pub struct ForecastService;

impl ForecastService {
    /// The requested date, or yesterday in the configured local time
    pub fn resolve_date(state: &AppState, date: Option<&str>) -> Result<NaiveDate, ApiError> {
        match date {
            Some(value) => parse_date(value),
            None => {
                let today = state.orchestrator.today();
                today.pred_opt().ok_or_else(|| ApiError::internal("Calendar underflow"))
            }
        }
    }

    /// Active zones joined with their predictions for `date`, as GeoJSON polygons
    pub async fn zones(state: &AppState, date: NaiveDate) -> Result<FeatureCollection, ApiError> {
        let stores = state.stores();
        let zones = stores.zones.list_active_zones().await?;
        let predictions = stores.forecasts.hourly_predictions_for_date(date).await?;

        let mut by_zone: HashMap<ZoneId, Vec<HourlyPrediction>> = HashMap::new();
        for prediction in predictions {
            by_zone.entry(prediction.zone_id).or_default().push(prediction);
        }

        let entries: Vec<ZoneWithPredictions> = zones
            .into_iter()
            .map(|zone| {
                let predictions = by_zone.remove(&zone.id).unwrap_or_default();
                ZoneWithPredictions { zone, predictions }
            })
            .collect();

        Ok(zone_collection(&entries))
    }

    pub async fn heatmap(state: &AppState, date: NaiveDate) -> Result<FeatureCollection, ApiError> {
        let points = state.stores().forecasts.heatmap_for_date(date).await?;
        Ok(heatmap_collection(&points))
    }

    pub async fn recommendations(
        state: &AppState,
        date: NaiveDate,
    ) -> Result<Vec<Recommendation>, ApiError> {
        Ok(state.stores().forecasts.recommendations_for_date(date).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2024-05-30").unwrap(), NaiveDate::from_ymd_opt(2024, 5, 30).unwrap());
        assert_eq!(parse_date(" 2024-05-30 ").unwrap().to_string(), "2024-05-30");

        let err = parse_date("30/05/2024").unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(parse_date("2024-02-30").is_err());
    }
}
