use async_trait::async_trait;
use geodemand_core::error::{GeodemandError, Result};
use geodemand_core::models::Coordinate;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::ports::{AreaStats, Narrator};

/// Narrator wrapper that bounds every call by a deadline
pub struct TimeoutNarrator {
    inner: Arc<dyn Narrator>,
    limit: Duration,
}

impl TimeoutNarrator {
    pub fn new(inner: Arc<dyn Narrator>, limit: Duration) -> Self {
        Self { inner, limit }
    }

    async fn bounded<T>(&self, call: impl Future<Output = Result<T>> + Send) -> Result<T> {
        match tokio::time::timeout(self.limit, call).await {
            Ok(result) => result,
            Err(_) => Err(GeodemandError::NarratorUnavailable {
                reason: format!(
                    "{} did not answer within {}ms",
                    self.inner.model_name(),
                    self.limit.as_millis()
                ),
            }),
        }
    }
}

#[async_trait]
impl Narrator for TimeoutNarrator {
    async fn name_for_coordinate(&self, location: &Coordinate) -> Result<String> {
        self.bounded(self.inner.name_for_coordinate(location)).await
    }

    async fn describe_area(&self, location: &Coordinate, stats: &AreaStats) -> Result<String> {
        self.bounded(self.inner.describe_area(location, stats)).await
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SlowNarrator {
        delay: Duration,
    }

    #[async_trait]
    impl Narrator for SlowNarrator {
        async fn name_for_coordinate(&self, _location: &Coordinate) -> Result<String> {
            tokio::time::sleep(self.delay).await;
            Ok("Yeoksam".to_string())
        }

        async fn describe_area(&self, _location: &Coordinate, _stats: &AreaStats) -> Result<String> {
            tokio::time::sleep(self.delay).await;
            Ok("Busy.".to_string())
        }

        fn model_name(&self) -> &str {
            "slow"
        }
    }

    #[tokio::test]
    async fn test_fast_call_passes_through() {
        let narrator = TimeoutNarrator::new(
            Arc::new(SlowNarrator { delay: Duration::from_millis(1) }),
            Duration::from_secs(5),
        );
        let name = narrator.name_for_coordinate(&Coordinate::new(37.5, 127.0)).await.unwrap();
        assert_eq!(name, "Yeoksam");
        assert_eq!(narrator.model_name(), "slow");
    }

    #[tokio::test]
    async fn test_slow_call_times_out() {
        let narrator = TimeoutNarrator::new(
            Arc::new(SlowNarrator { delay: Duration::from_secs(5) }),
            Duration::from_millis(20),
        );
        let stats = AreaStats {
            zone_name: "Yeoksam".to_string(),
            hour: 18,
            expected_calls: 9,
            avg_fee: 3500.0,
        };
        let result = narrator.describe_area(&Coordinate::new(37.5, 127.0), &stats).await;
        assert!(matches!(result, Err(GeodemandError::NarratorUnavailable { .. })));
    }
}
