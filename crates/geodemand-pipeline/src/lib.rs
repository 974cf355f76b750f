//! geodemand Pipeline - Demand prediction batch job
//!
//! Turns delivery history into ranked zones, hourly forecasts, a heatmap with
//! trend labels, and recommendations, one target date at a time.

pub mod aggregate;
pub mod heatmap;
pub mod hourly;
pub mod orchestrator;
pub mod recommend;
pub mod zones;

pub use aggregate::{aggregate, GeoCell};
pub use heatmap::{classify_trend, HeatmapBuilder};
pub use hourly::HourlyForecaster;
pub use orchestrator::{BatchOrchestrator, Clock, DayPhase, DayProgress, PipelineStores};
pub use recommend::RecommendationComposer;
pub use zones::{select_zones, SelectionParams, ZoneCandidate, ZoneSynchronizer};
