use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{GeodemandError, Result};

use super::geometry::{BoundingBox, Coordinate};

/// Unique identifier for a delivery event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub Uuid);

impl EventId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

/// Earnings breakdown of a single delivery, in currency units
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Earnings {
    pub base_fee: f64,
    #[serde(default)]
    pub tip: f64,
    #[serde(default)]
    pub bonus: f64,
}

impl Earnings {
    pub fn total(&self) -> f64 {
        self.base_fee + self.tip + self.bonus
    }
}

/// A completed delivery as recorded by the event store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryEvent {
    #[serde(default)]
    pub id: EventId,

    /// Where the order was picked up
    pub pickup: Coordinate,

    /// When the delivery was completed
    pub completed_at: DateTime<Utc>,

    pub earnings: Earnings,

    /// Pickup-to-dropoff duration
    pub duration_minutes: f64,

    /// Customer rating, if one was given
    #[serde(default)]
    pub rating: Option<f64>,
}

impl DeliveryEvent {
    /// Hour of day (0-23) of completion in the given local offset
    pub fn completed_hour(&self, offset: FixedOffset) -> usize {
        self.completed_at.with_timezone(&offset).hour() as usize
    }
}

/// Half-open time range `[start, end)` covering whole local calendar days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Number of calendar days covered
    pub days: u32,
}

impl TimeWindow {
    /// Window of `days` local calendar days whose last day is `date`.
    ///
    /// Fails with `InvalidDate` when the window reaches past the calendar
    /// range chrono can represent.
    pub fn ending_on(date: NaiveDate, days: u32, offset: FixedOffset) -> Result<Self> {
        let days = days.max(1);
        let out_of_range = || GeodemandError::InvalidDate {
            value: format!("{} (window of {} days is out of range)", date, days),
        };

        let first_day = date
            .checked_sub_signed(Duration::days(i64::from(days) - 1))
            .ok_or_else(out_of_range)?;
        let after_last_day = date.checked_add_signed(Duration::days(1)).ok_or_else(out_of_range)?;

        Ok(Self {
            start: local_midnight_utc(first_day, offset).ok_or_else(out_of_range)?,
            end: local_midnight_utc(after_last_day, offset).ok_or_else(out_of_range)?,
            days,
        })
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant < self.end
    }
}

fn local_midnight_utc(date: NaiveDate, offset: FixedOffset) -> Option<DateTime<Utc>> {
    let local = date.and_time(NaiveTime::MIN);
    let utc = local.checked_sub_signed(Duration::seconds(i64::from(offset.local_minus_utc())))?;
    Some(DateTime::<Utc>::from_naive_utc_and_offset(utc, Utc))
}

/// Filter for reading delivery events from the event store
#[derive(Debug, Clone, Copy)]
pub struct EventQuery {
    pub window: TimeWindow,
    pub area: Option<BoundingBox>,
}

impl EventQuery {
    pub fn new(window: TimeWindow) -> Self {
        Self { window, area: None }
    }

    pub fn within(mut self, area: BoundingBox) -> Self {
        self.area = Some(area);
        self
    }

    pub fn matches(&self, event: &DeliveryEvent) -> bool {
        self.window.contains(event.completed_at)
            && self.area.map(|a| a.contains(&event.pickup)).unwrap_or(true)
    }
}
