//! Fine-grained demand heatmap with short-term trend labels

use chrono::{DateTime, FixedOffset, NaiveDate, Timelike, Utc};
use geodemand_core::error::Result;
use geodemand_core::models::{BoundingBox, DeliveryEvent, HeatmapPoint, TimeWindow, Trend};
use geodemand_geo::grid::Resolution;
use geodemand_store::ForecastStore;
use std::sync::Arc;

use crate::aggregate::{aggregate, GeoCell};

/// Cells with fewer orders are left off the heatmap
pub const MIN_HEATMAP_ORDERS: u32 = 3;

/// Upper bound on points per date
pub const MAX_HEATMAP_POINTS: usize = 500;

/// Order count at which a point reaches full weight
const SATURATION_ORDERS: f64 = 20.0;

const RISING_RATIO: f64 = 1.2;
const FALLING_RATIO: f64 = 0.8;

/// Compare the current hour's volume against the previous hour's
pub fn classify_trend(current: u32, previous: u32) -> Trend {
    if previous == 0 {
        return if current > 0 { Trend::Rising } else { Trend::Stable };
    }

    let ratio = f64::from(current) / f64::from(previous);
    if ratio > RISING_RATIO {
        Trend::Rising
    } else if ratio < FALLING_RATIO {
        Trend::Falling
    } else {
        Trend::Stable
    }
}

pub struct HeatmapBuilder {
    forecasts: Arc<dyn ForecastStore>,
    service_area: BoundingBox,
    offset: FixedOffset,
}

impl HeatmapBuilder {
    pub fn new(
        forecasts: Arc<dyn ForecastStore>,
        service_area: BoundingBox,
        offset: FixedOffset,
    ) -> Self {
        Self { forecasts, service_area, offset }
    }

    /// Heatmap points for `date`, densest first.
    ///
    /// The trend compares the local hour of `now` with the hour before it,
    /// wrapping from 00 to 23.
    pub fn build(
        &self,
        events: &[DeliveryEvent],
        window: &TimeWindow,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Vec<HeatmapPoint> {
        let cells = aggregate(events, window, Resolution::FINE, &self.service_area, self.offset);

        let mut dense: Vec<(String, GeoCell)> = cells
            .into_values()
            .filter(|c| c.order_count >= MIN_HEATMAP_ORDERS)
            .map(|c| (c.cell.key(), c))
            .collect();
        dense.sort_by(|(a_key, a), (b_key, b)| {
            b.order_count.cmp(&a.order_count).then_with(|| a_key.cmp(b_key))
        });
        dense.truncate(MAX_HEATMAP_POINTS);

        let hour = now.with_timezone(&self.offset).hour() as usize;
        let previous_hour = (hour + 23) % 24;

        dense
            .into_iter()
            .map(|(_, cell)| HeatmapPoint {
                location: cell.cell.center(),
                weight: (f64::from(cell.order_count) / SATURATION_ORDERS).min(1.0),
                recent_orders: cell.order_count,
                avg_wait_minutes: cell.avg_duration().round() as u32,
                trend: classify_trend(cell.hourly[hour], cell.hourly[previous_hour]),
                target_date: date,
                created_at: now,
            })
            .collect()
    }

    /// Replace the stored heatmap for `date`
    pub async fn persist(&self, date: NaiveDate, points: &[HeatmapPoint]) -> Result<()> {
        self.forecasts.replace_heatmap(date, points).await
    }
}
