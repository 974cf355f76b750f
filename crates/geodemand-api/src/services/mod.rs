mod forecast;

pub use forecast::{parse_date, ForecastService};
