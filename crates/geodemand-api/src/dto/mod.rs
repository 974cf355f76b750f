mod request;
mod response;

pub use request::{DateQuery, RecomputeRequest, RunsQuery};
pub use response::{BackgroundRunResponse, HealthResponse, RecomputeResponse};
