use chrono::NaiveDate;
use serde::Deserialize;

/// Range recompute request body; `end` is exclusive
#[derive(Debug, Deserialize)]
pub struct RecomputeRequest {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Optional `?date=YYYY-MM-DD` selector for read endpoints
#[derive(Debug, Default, Deserialize)]
pub struct DateQuery {
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RunsQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    20
}
