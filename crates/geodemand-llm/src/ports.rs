//! Narrative port definitions

use async_trait::async_trait;
use geodemand_core::error::Result;
use geodemand_core::models::Coordinate;

/// Facts about an area handed to the narrator when describing it
#[derive(Debug, Clone, PartialEq)]
pub struct AreaStats {
    /// Display name of the zone
    pub zone_name: String,
    /// Hour of day the description is for
    pub hour: usize,
    /// Expected calls at that hour
    pub expected_calls: u32,
    /// Average earnings per delivery
    pub avg_fee: f64,
}

/// Port for natural-language enrichment.
///
/// Both operations are best effort: callers always have a deterministic
/// fallback and must not fail a computation because the narrator did.
#[async_trait]
pub trait Narrator: Send + Sync {
    /// Short human-readable name for the area around a coordinate
    async fn name_for_coordinate(&self, location: &Coordinate) -> Result<String>;

    /// One-sentence description of demand in an area
    async fn describe_area(&self, location: &Coordinate, stats: &AreaStats) -> Result<String>;

    /// Identifier of the backing model
    fn model_name(&self) -> &str;
}
