use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::geometry::Coordinate;
use super::zone::ZoneId;

/// Expected demand for one zone at one hour of day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyPrediction {
    pub zone_id: ZoneId,

    /// Hour of day, 0-23
    pub hour: u8,

    /// Average calls per day at this hour
    pub expected_calls: u32,

    /// Heuristic score in [0.20, 0.95]
    pub confidence: f64,

    pub prediction_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Hour-over-hour direction of demand in a heatmap cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Rising,
    Stable,
    Falling,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Rising => "rising",
            Trend::Stable => "stable",
            Trend::Falling => "falling",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Trend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rising" => Ok(Trend::Rising),
            "stable" => Ok(Trend::Stable),
            "falling" => Ok(Trend::Falling),
            other => Err(format!("unknown trend: {}", other)),
        }
    }
}

/// Recent order density sample on the fine grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapPoint {
    pub location: Coordinate,

    /// Relative intensity in [0, 1]
    pub weight: f64,

    pub recent_orders: u32,

    /// Average delivery duration in whole minutes
    pub avg_wait_minutes: u32,

    pub trend: Trend,
    pub target_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Where a recommendation came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    /// Driven by the zone's historical hourly demand
    HistoricalPattern,
    /// Demand in the zone is predicted to grow next hour
    DemandRising,
    /// Generic time-of-day rule
    TimeOfDay,
}

impl RecommendationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationKind::HistoricalPattern => "historical_pattern",
            RecommendationKind::DemandRising => "demand_rising",
            RecommendationKind::TimeOfDay => "time_of_day",
        }
    }
}

impl fmt::Display for RecommendationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecommendationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "historical_pattern" => Ok(RecommendationKind::HistoricalPattern),
            "demand_rising" => Ok(RecommendationKind::DemandRising),
            "time_of_day" => Ok(RecommendationKind::TimeOfDay),
            other => Err(format!("unknown recommendation kind: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    Low,
    Medium,
    High,
}

impl Impact {
    pub fn as_str(&self) -> &'static str {
        match self {
            Impact::Low => "low",
            Impact::Medium => "medium",
            Impact::High => "high",
        }
    }
}

impl fmt::Display for Impact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Impact {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Impact::Low),
            "medium" => Ok(Impact::Medium),
            "high" => Ok(Impact::High),
            other => Err(format!("unknown impact: {}", other)),
        }
    }
}

/// A human-readable suggestion for riders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub zone_id: ZoneId,
    pub kind: RecommendationKind,
    pub title: String,
    pub description: String,
    pub impact: Impact,
    pub confidence: f64,
    pub target_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}
