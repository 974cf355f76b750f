//! Hourly call forecasts for active zones

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use geodemand_core::error::Result;
use geodemand_core::models::{
    DeliveryEvent, HourlyPrediction, TimeWindow, Zone, ZoneId, ZoneWithPredictions,
};
use geodemand_geo::footprint::{centroid, within_radius, ZONE_RADIUS_DEG};
use geodemand_store::ForecastStore;
use std::sync::Arc;

const MIN_HOURLY_CONFIDENCE: f64 = 0.20;
const MAX_HOURLY_CONFIDENCE: f64 = 0.95;

/// Confidence of an hourly bucket from its raw event count
pub fn hourly_confidence(count: u32) -> f64 {
    (f64::from(count) * 0.01).clamp(MIN_HOURLY_CONFIDENCE, MAX_HOURLY_CONFIDENCE)
}

/// Per-zone, per-hour-of-day call forecasts
pub struct HourlyForecaster {
    forecasts: Arc<dyn ForecastStore>,
    offset: FixedOffset,
}

impl HourlyForecaster {
    pub fn new(forecasts: Arc<dyn ForecastStore>, offset: FixedOffset) -> Self {
        Self { forecasts, offset }
    }

    /// Predictions for every hour in which the zone saw at least one event.
    ///
    /// An event belongs to the zone when its pickup lies within
    /// `ZONE_RADIUS_DEG` of the footprint centroid. Hours without events
    /// produce no row.
    pub fn forecast(
        &self,
        zone: &Zone,
        events: &[DeliveryEvent],
        window: &TimeWindow,
        date: NaiveDate,
        created_at: DateTime<Utc>,
    ) -> Vec<HourlyPrediction> {
        let Some(center) = centroid(&zone.footprint) else {
            return Vec::new();
        };

        let mut buckets = [0u32; 24];
        for event in events {
            if window.contains(event.completed_at)
                && within_radius(&center, &event.pickup, ZONE_RADIUS_DEG)
            {
                buckets[event.completed_hour(self.offset)] += 1;
            }
        }

        let window_days = f64::from(window.days.max(1));

        buckets
            .iter()
            .enumerate()
            .filter(|(_, &count)| count > 0)
            .map(|(hour, &count)| HourlyPrediction {
                zone_id: zone.id,
                hour: hour as u8,
                expected_calls: (f64::from(count) / window_days).round() as u32,
                confidence: hourly_confidence(count),
                prediction_date: date,
                created_at,
            })
            .collect()
    }

    /// Replace the zone's predictions for `date`
    pub async fn persist(
        &self,
        zone_id: ZoneId,
        date: NaiveDate,
        predictions: &[HourlyPrediction],
    ) -> Result<()> {
        self.forecasts.replace_hourly_predictions(zone_id, date, predictions).await
    }

    /// Replace the predictions of every listed zone for `date` in one swap,
    /// returning the number of rows written
    pub async fn persist_day(
        &self,
        date: NaiveDate,
        zones: &[ZoneWithPredictions],
    ) -> Result<usize> {
        let zone_ids: Vec<ZoneId> = zones.iter().map(|entry| entry.zone.id).collect();
        let predictions: Vec<HourlyPrediction> =
            zones.iter().flat_map(|entry| entry.predictions.iter().cloned()).collect();

        self.forecasts.replace_hourly_predictions_for_zones(date, &zone_ids, &predictions).await?;
        Ok(predictions.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use geodemand_core::models::{Coordinate, Earnings, EventId};
    use geodemand_geo::footprint::{square_ring, ZONE_HALF_WIDTH_DEG};
    use geodemand_store::MemoryForecastStore;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 30).unwrap()
    }

    fn zone_at(lat: f64, lng: f64) -> Zone {
        let now = Utc::now();
        Zone {
            id: ZoneId::new(),
            cell_key: format!("{:.4}:{:.4}", lat, lng),
            name: "Test".to_string(),
            footprint: square_ring(&Coordinate::new(lat, lng), ZONE_HALF_WIDTH_DEG),
            expected_calls: 1,
            avg_fee: 3000.0,
            confidence: 0.5,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn event(lat: f64, lng: f64, day: u32, hour: u32) -> DeliveryEvent {
        DeliveryEvent {
            id: EventId::new(),
            pickup: Coordinate::new(lat, lng),
            completed_at: Utc.with_ymd_and_hms(2024, 5, day, hour, 0, 0).unwrap(),
            earnings: Earnings { base_fee: 3000.0, tip: 0.0, bonus: 0.0 },
            duration_minutes: 15.0,
            rating: None,
        }
    }

    fn forecaster() -> HourlyForecaster {
        HourlyForecaster::new(Arc::new(MemoryForecastStore::new()), utc())
    }

    #[test]
    fn test_hourly_confidence_clamps() {
        assert_eq!(hourly_confidence(1), 0.20);
        assert!((hourly_confidence(50) - 0.50).abs() < 1e-9);
        assert_eq!(hourly_confidence(500), 0.95);
    }

    #[test]
    fn test_buckets_events_near_centroid() {
        let zone = zone_at(37.5, 127.0);
        let window = TimeWindow::ending_on(date(), 2, utc()).unwrap();
        let events = vec![
            event(37.5, 127.0, 29, 12),
            event(37.503, 127.003, 30, 12),
            event(37.5, 127.0, 30, 18),
            // 0.006 degrees away, outside the radius
            event(37.506, 127.0, 30, 18),
        ];

        let predictions = forecaster().forecast(&zone, &events, &window, date(), Utc::now());
        assert_eq!(predictions.len(), 2);

        let noon = predictions.iter().find(|p| p.hour == 12).unwrap();
        assert_eq!(noon.expected_calls, 1);
        assert_eq!(noon.confidence, 0.20);
        assert_eq!(noon.prediction_date, date());
        assert_eq!(noon.zone_id, zone.id);

        let evening = predictions.iter().find(|p| p.hour == 18).unwrap();
        // one event over two days rounds half away from zero
        assert_eq!(evening.expected_calls, 1);
    }

    #[test]
    fn test_empty_zone_has_no_predictions() {
        let zone = zone_at(37.6, 127.1);
        let window = TimeWindow::ending_on(date(), 30, utc()).unwrap();
        let events = vec![event(37.5, 127.0, 20, 12)];

        assert!(forecaster().forecast(&zone, &events, &window, date(), Utc::now()).is_empty());
    }

    #[test]
    fn test_zone_without_footprint() {
        let mut zone = zone_at(37.5, 127.0);
        zone.footprint.clear();
        let window = TimeWindow::ending_on(date(), 30, utc()).unwrap();
        let events = vec![event(37.5, 127.0, 20, 12)];

        assert!(forecaster().forecast(&zone, &events, &window, date(), Utc::now()).is_empty());
    }

    #[tokio::test]
    async fn test_persist_replaces_slice() {
        let store = Arc::new(MemoryForecastStore::new());
        let forecaster = HourlyForecaster::new(store.clone(), utc());
        let zone = zone_at(37.5, 127.0);
        let window = TimeWindow::ending_on(date(), 1, utc()).unwrap();

        let first = forecaster.forecast(
            &zone,
            &[event(37.5, 127.0, 30, 9), event(37.5, 127.0, 30, 10)],
            &window,
            date(),
            Utc::now(),
        );
        forecaster.persist(zone.id, date(), &first).await.unwrap();

        let second =
            forecaster.forecast(&zone, &[event(37.5, 127.0, 30, 9)], &window, date(), Utc::now());
        forecaster.persist(zone.id, date(), &second).await.unwrap();

        let stored = store.hourly_predictions_for_date(date()).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].hour, 9);
    }

    #[tokio::test]
    async fn test_persist_day_swaps_every_zone() {
        let store = Arc::new(MemoryForecastStore::new());
        let forecaster = HourlyForecaster::new(store.clone(), utc());
        let busy = zone_at(37.5, 127.0);
        let quiet = zone_at(37.55, 127.05);
        let window = TimeWindow::ending_on(date(), 1, utc()).unwrap();

        let stale = forecaster.forecast(
            &quiet,
            &[event(37.55, 127.05, 30, 8)],
            &window,
            date(),
            Utc::now(),
        );
        forecaster.persist(quiet.id, date(), &stale).await.unwrap();

        let events = [event(37.5, 127.0, 30, 9), event(37.5, 127.0, 30, 10)];
        let day: Vec<ZoneWithPredictions> = [busy, quiet]
            .into_iter()
            .map(|zone| {
                let predictions = forecaster.forecast(&zone, &events, &window, date(), Utc::now());
                ZoneWithPredictions { zone, predictions }
            })
            .collect();

        assert_eq!(forecaster.persist_day(date(), &day).await.unwrap(), 2);

        let stored = store.hourly_predictions_for_date(date()).await.unwrap();
        assert_eq!(stored.len(), 2);
        assert!(stored.iter().all(|p| p.zone_id == day[0].zone.id));
    }
}
