//! Rolling-window aggregation of delivery events onto a grid

use chrono::FixedOffset;
use geodemand_core::models::{BoundingBox, DeliveryEvent, TimeWindow};
use geodemand_geo::grid::{snap, GridCell, Resolution};
use std::collections::HashMap;

/// Accumulated statistics of one grid cell over a window
#[derive(Debug, Clone, PartialEq)]
pub struct GeoCell {
    pub cell: GridCell,
    pub order_count: u32,
    pub total_earnings: f64,
    pub total_duration: f64,
    /// Sum of ratings; unrated deliveries contribute zero
    pub rating_sum: f64,
    /// Completions per local hour of day
    pub hourly: [u32; 24],
}

impl GeoCell {
    pub fn new(cell: GridCell) -> Self {
        Self {
            cell,
            order_count: 0,
            total_earnings: 0.0,
            total_duration: 0.0,
            rating_sum: 0.0,
            hourly: [0; 24],
        }
    }

    fn add(&mut self, event: &DeliveryEvent, offset: FixedOffset) {
        self.order_count += 1;
        self.total_earnings += event.earnings.total();
        self.total_duration += event.duration_minutes;
        self.rating_sum += event.rating.unwrap_or(0.0);
        self.hourly[event.completed_hour(offset)] += 1;
    }

    pub fn avg_earnings(&self) -> f64 {
        self.per_order(self.total_earnings)
    }

    pub fn avg_duration(&self) -> f64 {
        self.per_order(self.total_duration)
    }

    pub fn avg_rating(&self) -> f64 {
        self.per_order(self.rating_sum)
    }

    fn per_order(&self, total: f64) -> f64 {
        if self.order_count == 0 {
            0.0
        } else {
            total / f64::from(self.order_count)
        }
    }
}

/// Group events by grid cell.
///
/// Only events completed inside `window` with a pickup inside `service_area`
/// are counted; everything else is skipped.
pub fn aggregate(
    events: &[DeliveryEvent],
    window: &TimeWindow,
    resolution: Resolution,
    service_area: &BoundingBox,
    offset: FixedOffset,
) -> HashMap<GridCell, GeoCell> {
    let mut cells: HashMap<GridCell, GeoCell> = HashMap::new();

    for event in events {
        if !window.contains(event.completed_at) || !service_area.contains(&event.pickup) {
            continue;
        }
        let cell = snap(&event.pickup, resolution);
        cells.entry(cell).or_insert_with(|| GeoCell::new(cell)).add(event, offset);
    }

    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use geodemand_core::models::{Coordinate, Earnings, EventId};

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn event(lat: f64, lng: f64, day: u32, hour: u32, fee: f64) -> DeliveryEvent {
        DeliveryEvent {
            id: EventId::new(),
            pickup: Coordinate::new(lat, lng),
            completed_at: Utc.with_ymd_and_hms(2024, 5, day, hour, 15, 0).unwrap(),
            earnings: Earnings { base_fee: fee, tip: 500.0, bonus: 0.0 },
            duration_minutes: 12.0,
            rating: Some(4.0),
        }
    }

    fn window() -> TimeWindow {
        TimeWindow::ending_on(NaiveDate::from_ymd_opt(2024, 5, 30).unwrap(), 30, utc()).unwrap()
    }

    #[test]
    fn test_groups_by_cell_and_accumulates() {
        let events = vec![
            event(37.5001, 127.0001, 10, 12, 3000.0),
            event(37.4999, 126.9999, 11, 12, 3500.0),
            event(37.5200, 127.0001, 12, 18, 3000.0),
        ];

        let cells =
            aggregate(&events, &window(), Resolution::COARSE, &BoundingBox::seoul_metro(), utc());
        assert_eq!(cells.len(), 2);

        let cell = snap(&Coordinate::new(37.5, 127.0), Resolution::COARSE);
        let stats = &cells[&cell];
        assert_eq!(stats.order_count, 2);
        assert_eq!(stats.total_earnings, 7500.0);
        assert_eq!(stats.avg_earnings(), 3750.0);
        assert_eq!(stats.avg_duration(), 12.0);
        assert_eq!(stats.avg_rating(), 4.0);
        assert_eq!(stats.hourly[12], 2);
        assert_eq!(stats.hourly.iter().sum::<u32>(), 2);
    }

    #[test]
    fn test_drops_events_outside_area_and_window() {
        let events = vec![
            // Busan, outside the Seoul box
            event(35.1796, 129.0756, 10, 12, 3000.0),
            // Inside the box, after the window
            event(37.5, 127.0, 31, 12, 3000.0),
            event(37.5, 127.0, 15, 9, 3000.0),
        ];

        let cells =
            aggregate(&events, &window(), Resolution::COARSE, &BoundingBox::seoul_metro(), utc());
        assert_eq!(cells.len(), 1);
        assert_eq!(cells.values().next().unwrap().order_count, 1);
    }

    #[test]
    fn test_missing_rating_counts_as_zero() {
        let mut unrated = event(37.5, 127.0, 10, 12, 3000.0);
        unrated.rating = None;
        let events = vec![event(37.5, 127.0, 10, 12, 3000.0), unrated];

        let cells =
            aggregate(&events, &window(), Resolution::COARSE, &BoundingBox::seoul_metro(), utc());
        let stats = cells.values().next().unwrap();
        assert_eq!(stats.avg_rating(), 2.0);
    }

    #[test]
    fn test_hours_follow_offset() {
        let events = vec![event(37.5, 127.0, 10, 3, 3000.0)];
        let kst = FixedOffset::east_opt(9 * 3600).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 5, 30).unwrap();
        let window = TimeWindow::ending_on(date, 30, kst).unwrap();

        let cells = aggregate(&events, &window, Resolution::COARSE, &BoundingBox::seoul_metro(), kst);
        assert_eq!(cells.values().next().unwrap().hourly[12], 1);
    }

    #[test]
    fn test_empty_input() {
        let cells = aggregate(&[], &window(), Resolution::FINE, &BoundingBox::seoul_metro(), utc());
        assert!(cells.is_empty());
    }
}
