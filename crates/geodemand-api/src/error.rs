use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use geodemand_core::error::GeodemandError;
use serde::Serialize;

/// Unified API error type
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub details: Option<String>,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, message: message.into(), details: None }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self { status: StatusCode::NOT_FOUND, message: message.into(), details: None }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self { status: StatusCode::INTERNAL_SERVER_ERROR, message: message.into(), details: None }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody { error: self.message, details: self.details };
        (self.status, Json(body)).into_response()
    }
}

impl From<GeodemandError> for ApiError {
    fn from(err: GeodemandError) -> Self {
        match &err {
            e if e.is_validation() => {
                Self::bad_request("Invalid request").with_details(err.to_string())
            }
            GeodemandError::ZoneNotFound { .. } => {
                Self::not_found("Zone not found").with_details(err.to_string())
            }
            GeodemandError::Storage { .. } => {
                tracing::error!(error = %err, "Storage failure");
                Self::internal("Storage error").with_details(err.to_string())
            }
            _ => Self::internal("Internal error").with_details(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_validation_maps_to_bad_request() {
        let err = GeodemandError::RangeTooLong { days: 100, max: 92 };
        let api: ApiError = err.into();
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert!(api.details.unwrap().contains("100 days"));

        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let err =
            GeodemandError::InvalidDateRange { start: date, end: date, reason: "empty".into() };
        assert_eq!(ApiError::from(err).status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_storage_maps_to_internal() {
        let api: ApiError = GeodemandError::storage("replace_heatmap", "timeout").into();
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.message, "Storage error");
    }
}
