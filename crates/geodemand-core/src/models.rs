pub mod event;
pub mod forecast;
pub mod geometry;
pub mod run;
pub mod zone;

pub use event::{DeliveryEvent, Earnings, EventId, EventQuery, TimeWindow};
pub use forecast::{HeatmapPoint, HourlyPrediction, Impact, Recommendation, RecommendationKind, Trend};
pub use geometry::{BoundingBox, Coordinate};
pub use run::{DayFailure, DaySummary, RangeReport, RunId, RunRecord, RunStatus, RunTrigger};
pub use zone::{Zone, ZoneId, ZoneWithPredictions};
