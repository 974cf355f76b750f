use geodemand_core::models::{RangeReport, RunId};
use serde::Serialize;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self { status: "ok", service: "geodemand-api" }
    }
}

/// Result of a synchronous range recompute
#[derive(Debug, Serialize)]
pub struct RecomputeResponse {
    pub status: &'static str,
    #[serde(flatten)]
    pub report: RangeReport,
}

impl From<RangeReport> for RecomputeResponse {
    fn from(report: RangeReport) -> Self {
        let status = if report.is_success() { "completed" } else { "failed" };
        Self { status, report }
    }
}

/// Background recompute response (202 Accepted)
#[derive(Debug, Serialize)]
pub struct BackgroundRunResponse {
    pub run_id: RunId,
    pub status: String,
    pub message: String,
}

impl BackgroundRunResponse {
    pub fn accepted(run_id: RunId) -> Self {
        Self {
            run_id,
            status: "accepted".to_string(),
            message: format!("Recompute started. Poll GET /api/v1/runs/{} for progress.", run_id),
        }
    }
}
