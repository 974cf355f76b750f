use async_trait::async_trait;
use chrono::NaiveDate;
use geodemand_core::error::Result;
use geodemand_core::models::{
    DeliveryEvent, EventQuery, HeatmapPoint, HourlyPrediction, Recommendation, RunId, RunRecord,
    Zone, ZoneId,
};

/// Port for reading delivery history
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Append delivery events, returning how many were stored
    async fn insert_events(&self, events: &[DeliveryEvent]) -> Result<usize>;

    /// Events completed inside the query window and, if set, inside its area
    async fn events_in_window(&self, query: &EventQuery) -> Result<Vec<DeliveryEvent>>;
}

/// Port for persisted zones
#[async_trait]
pub trait ZoneStore: Send + Sync {
    /// Look up a zone by its grid cell key
    async fn find_zone_by_key(&self, cell_key: &str) -> Result<Option<Zone>>;

    /// Store a new zone. The cell key must not exist yet.
    async fn insert_zone(&self, zone: &Zone) -> Result<ZoneId>;

    /// Overwrite an existing zone, matched by id
    async fn update_zone(&self, zone: &Zone) -> Result<()>;

    /// All active zones, highest average fee first
    async fn list_active_zones(&self) -> Result<Vec<Zone>>;

    /// Mark every active zone not listed in `keep` inactive.
    /// Returns the number of zones deactivated.
    async fn deactivate_zones(&self, keep: &[ZoneId]) -> Result<usize>;
}

/// Port for per-date forecast outputs.
///
/// Every `replace_*` call swaps the stored slice atomically: readers see
/// either the previous rows or the new ones, never a mix or an empty gap.
#[async_trait]
pub trait ForecastStore: Send + Sync {
    /// Replace the hourly predictions of one zone for one date
    async fn replace_hourly_predictions(
        &self,
        zone_id: ZoneId,
        date: NaiveDate,
        predictions: &[HourlyPrediction],
    ) -> Result<()>;

    /// Replace the hourly predictions of every zone in `zone_ids` for one date
    /// in a single swap. Each prediction must belong to one of those zones.
    /// Zones not listed keep their rows.
    async fn replace_hourly_predictions_for_zones(
        &self,
        date: NaiveDate,
        zone_ids: &[ZoneId],
        predictions: &[HourlyPrediction],
    ) -> Result<()>;

    /// All hourly predictions for a date, ordered by zone then hour
    async fn hourly_predictions_for_date(&self, date: NaiveDate) -> Result<Vec<HourlyPrediction>>;

    /// Replace the heatmap for a date
    async fn replace_heatmap(&self, date: NaiveDate, points: &[HeatmapPoint]) -> Result<()>;

    /// Heatmap points for a date, densest first
    async fn heatmap_for_date(&self, date: NaiveDate) -> Result<Vec<HeatmapPoint>>;

    /// Replace the recommendations for a date
    async fn replace_recommendations(
        &self,
        date: NaiveDate,
        recommendations: &[Recommendation],
    ) -> Result<()>;

    /// Recommendations for a date in the order they were composed
    async fn recommendations_for_date(&self, date: NaiveDate) -> Result<Vec<Recommendation>>;
}

/// Port for batch run history
#[async_trait]
pub trait RunLogStore: Send + Sync {
    /// Insert or overwrite a run record
    async fn record_run(&self, record: &RunRecord) -> Result<()>;

    async fn get_run(&self, run_id: RunId) -> Result<Option<RunRecord>>;

    /// Most recently started runs first
    async fn recent_runs(&self, limit: usize) -> Result<Vec<RunRecord>>;
}
