use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::forecast::HourlyPrediction;
use super::geometry::Coordinate;

/// Unique identifier for a zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ZoneId(pub Uuid);

impl ZoneId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ZoneId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ZoneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A ranked, high-value area persisted across runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: ZoneId,

    /// Stable identity derived from the snapped grid cell.
    /// Two runs that find the same cell refer to the same zone.
    pub cell_key: String,

    /// Human-readable display name
    pub name: String,

    /// Closed ring (first point repeated last) around the zone center
    pub footprint: Vec<Coordinate>,

    /// Average calls per day over the discovery window
    pub expected_calls: u32,

    /// Average earnings per delivery
    pub avg_fee: f64,

    /// Heuristic score in [0.30, 0.95]
    pub confidence: f64,

    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An active zone together with its predictions for one target date
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneWithPredictions {
    pub zone: Zone,
    pub predictions: Vec<HourlyPrediction>,
}

impl ZoneWithPredictions {
    /// Expected calls for an hour of day, zero when nothing was predicted
    pub fn expected_calls_at(&self, hour: usize) -> u32 {
        self.predictions
            .iter()
            .find(|p| usize::from(p.hour) == hour)
            .map(|p| p.expected_calls)
            .unwrap_or(0)
    }

    pub fn prediction_at(&self, hour: usize) -> Option<&HourlyPrediction> {
        self.predictions.iter().find(|p| usize::from(p.hour) == hour)
    }
}
