use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for a batch run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What started a batch run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunTrigger {
    /// Periodic run for the previous day
    Scheduled,
    /// Single-day recompute requested by a caller
    OnDemand,
    /// Multi-day recompute
    Backfill,
}

impl RunTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunTrigger::Scheduled => "scheduled",
            RunTrigger::OnDemand => "on_demand",
            RunTrigger::Backfill => "backfill",
        }
    }
}

impl FromStr for RunTrigger {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(RunTrigger::Scheduled),
            "on_demand" => Ok(RunTrigger::OnDemand),
            "backfill" => Ok(RunTrigger::Backfill),
            other => Err(format!("unknown run trigger: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
        }
    }
}

impl FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(RunStatus::Running),
            "completed" => Ok(RunStatus::Completed),
            "failed" => Ok(RunStatus::Failed),
            other => Err(format!("unknown run status: {}", other)),
        }
    }
}

/// Output counts of one recomputed day.
///
/// `zones == 0` is a valid, successful result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub zones: usize,
    pub predictions: usize,
    pub heatmap_points: usize,
    pub recommendations: usize,
}

/// The day at which a range recompute stopped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayFailure {
    pub date: NaiveDate,
    pub error: String,
}

/// Result of a multi-day recompute.
///
/// Days before `failure` completed and stay committed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeReport {
    pub completed: Vec<DaySummary>,
    pub failure: Option<DayFailure>,
}

impl RangeReport {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

/// Durable record of a batch execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: RunId,
    pub trigger: RunTrigger,
    pub status: RunStatus,

    /// First and last-exclusive target dates requested
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,

    pub days: Vec<DaySummary>,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunRecord {
    pub fn started(trigger: RunTrigger, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            run_id: RunId::new(),
            trigger,
            status: RunStatus::Running,
            start_date,
            end_date,
            days: Vec::new(),
            error: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Close the record from a range report
    pub fn finish(&mut self, report: &RangeReport) {
        self.days = report.completed.clone();
        self.finished_at = Some(Utc::now());
        match &report.failure {
            Some(failure) => {
                self.status = RunStatus::Failed;
                self.error = Some(format!("{}: {}", failure.date, failure.error));
            }
            None => self.status = RunStatus::Completed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn summary(d: u32) -> DaySummary {
        DaySummary { date: date(d), zones: 3, predictions: 10, heatmap_points: 40, recommendations: 2 }
    }

    #[test]
    fn test_finish_completed() {
        let mut record = RunRecord::started(RunTrigger::Backfill, date(1), date(3));
        assert_eq!(record.status, RunStatus::Running);

        let report = RangeReport { completed: vec![summary(1), summary(2)], failure: None };
        record.finish(&report);

        assert_eq!(record.status, RunStatus::Completed);
        assert_eq!(record.days.len(), 2);
        assert!(record.error.is_none());
        assert!(record.finished_at.is_some());
    }

    #[test]
    fn test_finish_failed_keeps_completed_days() {
        let mut record = RunRecord::started(RunTrigger::Backfill, date(1), date(4));
        let report = RangeReport {
            completed: vec![summary(1)],
            failure: Some(DayFailure { date: date(2), error: "db down".to_string() }),
        };
        record.finish(&report);

        assert_eq!(record.status, RunStatus::Failed);
        assert_eq!(record.days, vec![summary(1)]);
        assert_eq!(record.error.as_deref(), Some("2024-05-02: db down"));
        assert!(!report.is_success());
    }

    #[test]
    fn test_trigger_parse() {
        assert_eq!("on_demand".parse::<RunTrigger>().unwrap(), RunTrigger::OnDemand);
        assert_eq!("failed".parse::<RunStatus>().unwrap(), RunStatus::Failed);
        assert!("nightly".parse::<RunTrigger>().is_err());
    }
}
