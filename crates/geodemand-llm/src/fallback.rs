//! Deterministic replacements for narrator output

use async_trait::async_trait;
use geodemand_core::error::{GeodemandError, Result};
use geodemand_core::models::Coordinate;

use crate::ports::{AreaStats, Narrator};

/// Coordinate-based zone name, e.g. `"Zone 37.500, 127.035"`
pub fn fallback_zone_name(location: &Coordinate) -> String {
    format!("Zone {:.3}, {:.3}", location.lat, location.lng)
}

/// Name from the narrator, or the coordinate fallback when it fails
pub async fn name_or_fallback(narrator: &dyn Narrator, location: &Coordinate) -> String {
    match narrator.name_for_coordinate(location).await {
        Ok(name) => name,
        Err(e) => {
            let fallback = fallback_zone_name(location);
            tracing::warn!(
                error = %e,
                model = narrator.model_name(),
                fallback = %fallback,
                "Zone naming failed, using coordinate name"
            );
            fallback
        }
    }
}

/// `template` followed by the narrator's description, or `template` alone
/// when the narrator fails
pub async fn describe_or_template(
    narrator: &dyn Narrator,
    location: &Coordinate,
    stats: &AreaStats,
    template: String,
) -> String {
    match narrator.describe_area(location, stats).await {
        Ok(narrative) => format!("{} {}", template, narrative),
        Err(e) => {
            tracing::warn!(
                error = %e,
                model = narrator.model_name(),
                zone = %stats.zone_name,
                "Area description failed, using template only"
            );
            template
        }
    }
}

/// Narrator that never answers, forcing every caller onto its fallback
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineNarrator;

#[async_trait]
impl Narrator for OfflineNarrator {
    async fn name_for_coordinate(&self, _location: &Coordinate) -> Result<String> {
        Err(GeodemandError::NarratorUnavailable { reason: "narrator is offline".to_string() })
    }

    async fn describe_area(&self, _location: &Coordinate, _stats: &AreaStats) -> Result<String> {
        Err(GeodemandError::NarratorUnavailable { reason: "narrator is offline".to_string() })
    }

    fn model_name(&self) -> &str {
        "offline"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedNarrator;

    #[async_trait]
    impl Narrator for FixedNarrator {
        async fn name_for_coordinate(&self, _location: &Coordinate) -> Result<String> {
            Ok("Seolleung".to_string())
        }

        async fn describe_area(&self, _location: &Coordinate, stats: &AreaStats) -> Result<String> {
            Ok(format!("Offices empty out near {}.", stats.zone_name))
        }

        fn model_name(&self) -> &str {
            "fixed"
        }
    }

    fn stats() -> AreaStats {
        AreaStats { zone_name: "Seolleung".to_string(), hour: 12, expected_calls: 6, avg_fee: 4000.0 }
    }

    #[test]
    fn test_fallback_zone_name() {
        assert_eq!(fallback_zone_name(&Coordinate::new(37.5, 127.035)), "Zone 37.500, 127.035");
        assert_eq!(fallback_zone_name(&Coordinate::new(-33.87, 151.21)), "Zone -33.870, 151.210");
    }

    #[tokio::test]
    async fn test_name_or_fallback() {
        let location = Coordinate::new(37.5, 127.035);
        assert_eq!(name_or_fallback(&FixedNarrator, &location).await, "Seolleung");
        assert_eq!(name_or_fallback(&OfflineNarrator, &location).await, "Zone 37.500, 127.035");
    }

    #[tokio::test]
    async fn test_describe_or_template() {
        let location = Coordinate::new(37.5, 127.035);
        let described =
            describe_or_template(&FixedNarrator, &location, &stats(), "6 calls expected.".to_string())
                .await;
        assert_eq!(described, "6 calls expected. Offices empty out near Seolleung.");

        let plain =
            describe_or_template(&OfflineNarrator, &location, &stats(), "6 calls expected.".to_string())
                .await;
        assert_eq!(plain, "6 calls expected.");
    }
}
