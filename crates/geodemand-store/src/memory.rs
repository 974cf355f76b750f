//! In-memory storage implementations for development and testing.
//!
//! These implementations use `RwLock::unwrap()` intentionally. Lock poisoning
//! only occurs when another thread panicked while holding the lock, which is
//! an unrecoverable state. For production workloads, use the PostgreSQL backend.

use async_trait::async_trait;
use chrono::NaiveDate;
use geodemand_core::error::{GeodemandError, Result};
use geodemand_core::models::{
    DeliveryEvent, EventQuery, HeatmapPoint, HourlyPrediction, Recommendation, RunId, RunRecord,
    Zone, ZoneId,
};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::ports::{EventStore, ForecastStore, RunLogStore, ZoneStore};

/// In-memory implementation of EventStore
#[derive(Debug, Clone, Default)]
pub struct MemoryEventStore {
    events: Arc<RwLock<Vec<DeliveryEvent>>>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store preloaded with events
    pub fn with_events(events: Vec<DeliveryEvent>) -> Self {
        Self { events: Arc::new(RwLock::new(events)) }
    }

    pub fn len(&self) -> usize {
        self.events.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn insert_events(&self, events: &[DeliveryEvent]) -> Result<usize> {
        let mut stored = self.events.write().unwrap();
        stored.extend_from_slice(events);
        Ok(events.len())
    }

    async fn events_in_window(&self, query: &EventQuery) -> Result<Vec<DeliveryEvent>> {
        let events = self.events.read().unwrap();
        let mut matching: Vec<DeliveryEvent> =
            events.iter().filter(|e| query.matches(e)).cloned().collect();
        matching.sort_by_key(|e| e.completed_at);
        Ok(matching)
    }
}

/// In-memory implementation of ZoneStore
#[derive(Debug, Clone, Default)]
pub struct MemoryZoneStore {
    zones: Arc<RwLock<HashMap<ZoneId, Zone>>>,
}

impl MemoryZoneStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored zone, active or not
    pub fn all_zones(&self) -> Vec<Zone> {
        let zones = self.zones.read().unwrap();
        let mut all: Vec<Zone> = zones.values().cloned().collect();
        all.sort_by(|a, b| a.cell_key.cmp(&b.cell_key));
        all
    }
}

#[async_trait]
impl ZoneStore for MemoryZoneStore {
    async fn find_zone_by_key(&self, cell_key: &str) -> Result<Option<Zone>> {
        let zones = self.zones.read().unwrap();
        Ok(zones.values().find(|z| z.cell_key == cell_key).cloned())
    }

    async fn insert_zone(&self, zone: &Zone) -> Result<ZoneId> {
        let mut zones = self.zones.write().unwrap();
        if zones.values().any(|z| z.cell_key == zone.cell_key) {
            return Err(GeodemandError::storage(
                "insert_zone",
                format!("zone with cell key {} already exists", zone.cell_key),
            ));
        }
        zones.insert(zone.id, zone.clone());
        Ok(zone.id)
    }

    async fn update_zone(&self, zone: &Zone) -> Result<()> {
        let mut zones = self.zones.write().unwrap();
        match zones.get_mut(&zone.id) {
            Some(existing) => {
                *existing = zone.clone();
                Ok(())
            }
            None => Err(GeodemandError::ZoneNotFound { key: zone.cell_key.clone() }),
        }
    }

    async fn list_active_zones(&self) -> Result<Vec<Zone>> {
        let zones = self.zones.read().unwrap();
        let mut active: Vec<Zone> = zones.values().filter(|z| z.is_active).cloned().collect();
        active.sort_by(|a, b| {
            b.avg_fee.total_cmp(&a.avg_fee).then_with(|| a.cell_key.cmp(&b.cell_key))
        });
        Ok(active)
    }

    async fn deactivate_zones(&self, keep: &[ZoneId]) -> Result<usize> {
        let mut zones = self.zones.write().unwrap();
        let now = chrono::Utc::now();
        let mut deactivated = 0;
        for zone in zones.values_mut() {
            if zone.is_active && !keep.contains(&zone.id) {
                zone.is_active = false;
                zone.updated_at = now;
                deactivated += 1;
            }
        }
        Ok(deactivated)
    }
}

/// In-memory implementation of ForecastStore
#[derive(Debug, Clone, Default)]
pub struct MemoryForecastStore {
    hourly: Arc<RwLock<HashMap<(ZoneId, NaiveDate), Vec<HourlyPrediction>>>>,
    heatmaps: Arc<RwLock<HashMap<NaiveDate, Vec<HeatmapPoint>>>>,
    recommendations: Arc<RwLock<HashMap<NaiveDate, Vec<Recommendation>>>>,
}

impl MemoryForecastStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ForecastStore for MemoryForecastStore {
    async fn replace_hourly_predictions(
        &self,
        zone_id: ZoneId,
        date: NaiveDate,
        predictions: &[HourlyPrediction],
    ) -> Result<()> {
        let mut hourly = self.hourly.write().unwrap();
        if predictions.is_empty() {
            hourly.remove(&(zone_id, date));
        } else {
            let mut rows = predictions.to_vec();
            rows.sort_by_key(|p| p.hour);
            hourly.insert((zone_id, date), rows);
        }
        Ok(())
    }

    async fn replace_hourly_predictions_for_zones(
        &self,
        date: NaiveDate,
        zone_ids: &[ZoneId],
        predictions: &[HourlyPrediction],
    ) -> Result<()> {
        let mut grouped: HashMap<ZoneId, Vec<HourlyPrediction>> = HashMap::new();
        for prediction in predictions {
            if !zone_ids.contains(&prediction.zone_id) {
                return Err(GeodemandError::storage(
                    "replace_hourly_predictions_for_zones",
                    format!("prediction for unlisted zone {}", prediction.zone_id),
                ));
            }
            grouped.entry(prediction.zone_id).or_default().push(prediction.clone());
        }

        let mut hourly = self.hourly.write().unwrap();
        for zone_id in zone_ids {
            hourly.remove(&(*zone_id, date));
        }
        for (zone_id, mut rows) in grouped {
            rows.sort_by_key(|p| p.hour);
            hourly.insert((zone_id, date), rows);
        }
        Ok(())
    }

    async fn hourly_predictions_for_date(&self, date: NaiveDate) -> Result<Vec<HourlyPrediction>> {
        let hourly = self.hourly.read().unwrap();
        let mut rows: Vec<HourlyPrediction> = hourly
            .iter()
            .filter(|((_, d), _)| *d == date)
            .flat_map(|(_, rows)| rows.iter().cloned())
            .collect();
        rows.sort_by(|a, b| a.zone_id.0.cmp(&b.zone_id.0).then(a.hour.cmp(&b.hour)));
        Ok(rows)
    }

    async fn replace_heatmap(&self, date: NaiveDate, points: &[HeatmapPoint]) -> Result<()> {
        let mut heatmaps = self.heatmaps.write().unwrap();
        heatmaps.insert(date, points.to_vec());
        Ok(())
    }

    async fn heatmap_for_date(&self, date: NaiveDate) -> Result<Vec<HeatmapPoint>> {
        let heatmaps = self.heatmaps.read().unwrap();
        let mut points = heatmaps.get(&date).cloned().unwrap_or_default();
        points.sort_by(|a, b| b.recent_orders.cmp(&a.recent_orders));
        Ok(points)
    }

    async fn replace_recommendations(
        &self,
        date: NaiveDate,
        recommendations: &[Recommendation],
    ) -> Result<()> {
        let mut stored = self.recommendations.write().unwrap();
        stored.insert(date, recommendations.to_vec());
        Ok(())
    }

    async fn recommendations_for_date(&self, date: NaiveDate) -> Result<Vec<Recommendation>> {
        let stored = self.recommendations.read().unwrap();
        Ok(stored.get(&date).cloned().unwrap_or_default())
    }
}

/// In-memory implementation of RunLogStore
#[derive(Debug, Clone, Default)]
pub struct MemoryRunLog {
    runs: Arc<RwLock<HashMap<RunId, RunRecord>>>,
}

impl MemoryRunLog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RunLogStore for MemoryRunLog {
    async fn record_run(&self, record: &RunRecord) -> Result<()> {
        let mut runs = self.runs.write().unwrap();
        runs.insert(record.run_id, record.clone());
        Ok(())
    }

    async fn get_run(&self, run_id: RunId) -> Result<Option<RunRecord>> {
        let runs = self.runs.read().unwrap();
        Ok(runs.get(&run_id).cloned())
    }

    async fn recent_runs(&self, limit: usize) -> Result<Vec<RunRecord>> {
        let runs = self.runs.read().unwrap();
        let mut recent: Vec<RunRecord> = runs.values().cloned().collect();
        recent.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        recent.truncate(limit);
        Ok(recent)
    }
}
