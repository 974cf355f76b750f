mod forecasts;
mod health;
mod recompute;
mod runs;

pub use forecasts::{get_heatmap, get_recommendations, get_zones};
pub use health::health_check;
pub use recompute::{recompute_date, recompute_date_background, recompute_range};
pub use runs::{get_run, list_runs};
