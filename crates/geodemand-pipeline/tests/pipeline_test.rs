//! End-to-end tests of the batch pipeline against the in-memory stores

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use geodemand_core::config::PipelineSettings;
use geodemand_core::error::{GeodemandError, Result};
use geodemand_core::models::{
    Coordinate, DeliveryEvent, Earnings, EventId, HeatmapPoint, HourlyPrediction, Recommendation,
    RunStatus, Zone, ZoneId,
};
use geodemand_geo::footprint::{square_ring, ZONE_HALF_WIDTH_DEG};
use geodemand_llm::{AreaStats, Narrator, OfflineNarrator};
use geodemand_pipeline::{BatchOrchestrator, DayPhase, PipelineStores};
use geodemand_store::{
    ForecastStore, MemoryEventStore, MemoryForecastStore, MemoryRunLog, MemoryZoneStore,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct StubNarrator;

#[async_trait]
impl Narrator for StubNarrator {
    async fn name_for_coordinate(&self, _location: &Coordinate) -> Result<String> {
        Ok("Gangnam Station".to_string())
    }

    async fn describe_area(&self, _location: &Coordinate, _stats: &AreaStats) -> Result<String> {
        Ok("Office towers order lunch in bulk.".to_string())
    }

    fn model_name(&self) -> &str {
        "stub"
    }
}

/// Forecast store that fails to write the heatmap for one date
struct FlakyForecasts {
    inner: MemoryForecastStore,
    fail_on: NaiveDate,
}

#[async_trait]
impl ForecastStore for FlakyForecasts {
    async fn replace_hourly_predictions(
        &self,
        zone_id: ZoneId,
        date: NaiveDate,
        predictions: &[HourlyPrediction],
    ) -> Result<()> {
        self.inner.replace_hourly_predictions(zone_id, date, predictions).await
    }

    async fn replace_hourly_predictions_for_zones(
        &self,
        date: NaiveDate,
        zone_ids: &[ZoneId],
        predictions: &[HourlyPrediction],
    ) -> Result<()> {
        self.inner.replace_hourly_predictions_for_zones(date, zone_ids, predictions).await
    }

    async fn hourly_predictions_for_date(&self, date: NaiveDate) -> Result<Vec<HourlyPrediction>> {
        self.inner.hourly_predictions_for_date(date).await
    }

    async fn replace_heatmap(&self, date: NaiveDate, points: &[HeatmapPoint]) -> Result<()> {
        if date == self.fail_on {
            return Err(GeodemandError::storage("replace_heatmap", "connection reset"));
        }
        self.inner.replace_heatmap(date, points).await
    }

    async fn heatmap_for_date(&self, date: NaiveDate) -> Result<Vec<HeatmapPoint>> {
        self.inner.heatmap_for_date(date).await
    }

    async fn replace_recommendations(
        &self,
        date: NaiveDate,
        recommendations: &[Recommendation],
    ) -> Result<()> {
        self.inner.replace_recommendations(date, recommendations).await
    }

    async fn recommendations_for_date(&self, date: NaiveDate) -> Result<Vec<Recommendation>> {
        self.inner.recommendations_for_date(date).await
    }
}

fn kst() -> FixedOffset {
    FixedOffset::east_opt(9 * 3600).unwrap()
}

fn local(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    kst().with_ymd_and_hms(2024, 5, day, hour, minute, 0).unwrap().with_timezone(&Utc)
}

fn target() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 30).unwrap()
}

fn delivery(lat: f64, lng: f64, completed_at: DateTime<Utc>) -> DeliveryEvent {
    DeliveryEvent {
        id: EventId::new(),
        pickup: Coordinate::new(lat, lng),
        completed_at,
        earnings: Earnings { base_fee: 3500.0, tip: 500.0, bonus: 0.0 },
        duration_minutes: 15.0,
        rating: Some(5.0),
    }
}

/// Twelve lunchtime deliveries from one pickup spot near Gangnam
fn twelve_lunch_orders() -> Vec<DeliveryEvent> {
    (0..12).map(|i| delivery(37.5, 127.035, local(18 + i, 12, 10))).collect()
}

fn orchestrator_with(stores: PipelineStores, narrator: Arc<dyn Narrator>) -> BatchOrchestrator {
    // Pinned to 12:30 local time on the day after the target
    let now = local(31, 12, 30);
    BatchOrchestrator::new(stores, narrator, PipelineSettings::default())
        .with_clock(Arc::new(move || now))
}

fn orchestrator(events: Vec<DeliveryEvent>) -> BatchOrchestrator {
    orchestrator_with(
        PipelineStores::in_memory_with(MemoryEventStore::with_events(events)),
        Arc::new(StubNarrator),
    )
}

#[tokio::test]
async fn test_twelve_orders_make_one_zone() {
    let orchestrator = orchestrator(twelve_lunch_orders());

    let summary = orchestrator.run_one(target()).await.unwrap();
    assert_eq!(summary.date, target());
    assert_eq!(summary.zones, 1);

    let zones = orchestrator.stores().zones.list_active_zones().await.unwrap();
    assert_eq!(zones.len(), 1);
    let zone = &zones[0];
    assert_eq!(zone.cell_key, "37.5000:127.0350");
    assert_eq!(zone.name, "Gangnam Station");
    assert!((zone.avg_fee - 4000.0).abs() < 1e-9);
    assert_eq!(zone.confidence, 0.95);
    assert_eq!(zone.footprint.len(), 5);

    let predictions =
        orchestrator.stores().forecasts.hourly_predictions_for_date(target()).await.unwrap();
    assert_eq!(predictions.len(), 1);
    assert_eq!(predictions[0].hour, 12);
    assert_eq!(predictions[0].zone_id, zone.id);
    assert_eq!(summary.predictions, 1);
}

#[tokio::test]
async fn test_events_outside_service_area_are_ignored() {
    // Haeundae, Busan
    let events: Vec<DeliveryEvent> =
        (0..15).map(|i| delivery(35.1587, 129.1604, local(10 + i, 19, 0))).collect();
    let orchestrator = orchestrator(events);

    let summary = orchestrator.run_one(target()).await.unwrap();
    assert_eq!(summary.zones, 0);
    assert_eq!(summary.heatmap_points, 0);
    assert!(orchestrator.stores().zones.list_active_zones().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_no_history_is_a_successful_empty_day() {
    let orchestrator = orchestrator(Vec::new());

    let summary = orchestrator.run_one(target()).await.unwrap();
    assert_eq!(summary.zones, 0);
    assert_eq!(summary.predictions, 0);
    assert_eq!(summary.heatmap_points, 0);
    assert_eq!(summary.recommendations, 0);

    let runs = orchestrator.stores().runs.recent_runs(5).await.unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].status, RunStatus::Completed);
}

#[tokio::test]
async fn test_rerunning_a_date_is_idempotent() {
    let mut events = twelve_lunch_orders();
    events.extend((0..6).map(|i| delivery(37.55, 126.92, local(28, 18, i * 5))));
    let orchestrator = orchestrator(events);

    orchestrator.run_one(target()).await.unwrap();
    let stores = orchestrator.stores();
    let zones_first = stores.zones.list_active_zones().await.unwrap();
    let predictions_first = stores.forecasts.hourly_predictions_for_date(target()).await.unwrap();
    let heatmap_first = stores.forecasts.heatmap_for_date(target()).await.unwrap();
    let recs_first = stores.forecasts.recommendations_for_date(target()).await.unwrap();

    orchestrator.run_one(target()).await.unwrap();
    let zones_second = stores.zones.list_active_zones().await.unwrap();
    let predictions_second = stores.forecasts.hourly_predictions_for_date(target()).await.unwrap();
    let heatmap_second = stores.forecasts.heatmap_for_date(target()).await.unwrap();
    let recs_second = stores.forecasts.recommendations_for_date(target()).await.unwrap();

    assert_eq!(zones_first.len(), zones_second.len());
    assert_eq!(zones_first[0].id, zones_second[0].id);
    assert_eq!(zones_first[0].confidence, zones_second[0].confidence);

    let hours = |p: &[HourlyPrediction]| {
        p.iter().map(|p| (p.zone_id, p.hour, p.expected_calls)).collect::<Vec<_>>()
    };
    assert_eq!(hours(&predictions_first), hours(&predictions_second));

    let cells = |h: &[HeatmapPoint]| {
        h.iter().map(|p| (p.recent_orders, p.avg_wait_minutes, p.trend)).collect::<Vec<_>>()
    };
    assert_eq!(heatmap_first.len(), 2);
    assert_eq!(cells(&heatmap_first), cells(&heatmap_second));

    let titles = |r: &[Recommendation]| r.iter().map(|r| r.title.clone()).collect::<Vec<_>>();
    assert_eq!(titles(&recs_first), titles(&recs_second));
}

#[tokio::test]
async fn test_zone_without_nearby_events_gets_no_predictions() {
    let stores = PipelineStores::in_memory_with(MemoryEventStore::with_events(twelve_lunch_orders()));

    let now = Utc::now();
    let far = Zone {
        id: ZoneId::new(),
        cell_key: "37.6500:127.1000".to_string(),
        name: "Quiet".to_string(),
        footprint: square_ring(&Coordinate::new(37.65, 127.1), ZONE_HALF_WIDTH_DEG),
        expected_calls: 0,
        avg_fee: 1000.0,
        confidence: 0.3,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    stores.zones.insert_zone(&far).await.unwrap();

    let orchestrator = orchestrator_with(stores, Arc::new(StubNarrator));
    orchestrator.run_one(target()).await.unwrap();

    let predictions =
        orchestrator.stores().forecasts.hourly_predictions_for_date(target()).await.unwrap();
    assert!(!predictions.is_empty());
    assert!(predictions.iter().all(|p| p.zone_id != far.id));
}

#[tokio::test]
async fn test_offline_narrator_falls_back_to_coordinates() {
    let orchestrator = orchestrator_with(
        PipelineStores::in_memory_with(MemoryEventStore::with_events(twelve_lunch_orders())),
        Arc::new(OfflineNarrator),
    );

    orchestrator.run_one(target()).await.unwrap();

    let zones = orchestrator.stores().zones.list_active_zones().await.unwrap();
    assert_eq!(zones[0].name, "Zone 37.500, 127.035");
}

#[tokio::test]
async fn test_lunch_hour_recommendation_targets_best_zone() {
    let orchestrator = orchestrator(twelve_lunch_orders());
    orchestrator.run_one(target()).await.unwrap();

    let zones = orchestrator.stores().zones.list_active_zones().await.unwrap();
    let recs =
        orchestrator.stores().forecasts.recommendations_for_date(target()).await.unwrap();

    // 12:30 local falls in the lunch rule; 12 orders over 30 days is too
    // few for a pattern recommendation
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].title, "Lunch rush");
    assert_eq!(recs[0].zone_id, zones[0].id);
}

#[tokio::test]
async fn test_range_stops_at_first_failing_day() {
    let failing_day = NaiveDate::from_ymd_opt(2024, 5, 29).unwrap();
    let stores = PipelineStores {
        events: Arc::new(MemoryEventStore::with_events(twelve_lunch_orders())),
        zones: Arc::new(MemoryZoneStore::new()),
        forecasts: Arc::new(FlakyForecasts {
            inner: MemoryForecastStore::new(),
            fail_on: failing_day,
        }),
        runs: Arc::new(MemoryRunLog::new()),
    };
    let orchestrator = orchestrator_with(stores, Arc::new(StubNarrator));

    let start = NaiveDate::from_ymd_opt(2024, 5, 28).unwrap();
    let end = NaiveDate::from_ymd_opt(2024, 5, 31).unwrap();

    let phases = Mutex::new(Vec::new());
    let report = orchestrator
        .run_range_with_progress(start, end, |p| phases.lock().unwrap().push(p.phase))
        .await
        .unwrap();

    assert!(!report.is_success());
    assert_eq!(report.completed.len(), 1);
    assert_eq!(report.completed[0].date, start);
    let failure = report.failure.as_ref().unwrap();
    assert_eq!(failure.date, failing_day);
    assert!(failure.error.contains("replace_heatmap"));

    assert_eq!(
        *phases.lock().unwrap(),
        vec![DayPhase::Started, DayPhase::Completed, DayPhase::Started, DayPhase::Failed]
    );

    // The day before the failure stays written
    let kept = orchestrator.stores().forecasts.heatmap_for_date(start).await.unwrap();
    assert_eq!(kept.len(), 1);

    let runs = orchestrator.stores().runs.recent_runs(5).await.unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].status, RunStatus::Failed);
    assert_eq!(runs[0].days.len(), 1);
    assert!(runs[0].error.as_deref().unwrap().starts_with("2024-05-29"));
}

#[tokio::test]
async fn test_range_validation() {
    let orchestrator = orchestrator(Vec::new());
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

    let err = orchestrator.run_range(start, start).await.unwrap_err();
    assert!(err.is_validation());

    let too_far = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    let err = orchestrator.run_range(start, too_far).await.unwrap_err();
    assert!(matches!(err, GeodemandError::RangeTooLong { .. }));

    assert!(orchestrator.stores().runs.recent_runs(5).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_run_yesterday_targets_previous_local_day() {
    let orchestrator = orchestrator(twelve_lunch_orders());

    // Clock is pinned to 2024-05-31 local
    let summary = orchestrator.run_yesterday().await.unwrap();
    assert_eq!(summary.date, target());

    let runs = orchestrator.stores().runs.recent_runs(1).await.unwrap();
    assert_eq!(runs[0].trigger.as_str(), "scheduled");
}

#[tokio::test]
async fn test_spawned_run_completes_in_background() {
    let orchestrator = Arc::new(orchestrator(twelve_lunch_orders()));

    let run_id = orchestrator.spawn_one(target()).await.unwrap();

    let mut status = RunStatus::Running;
    for _ in 0..100 {
        let record = orchestrator.stores().runs.get_run(run_id).await.unwrap().unwrap();
        status = record.status;
        if status != RunStatus::Running {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(status, RunStatus::Completed);

    let zones = orchestrator.stores().zones.list_active_zones().await.unwrap();
    assert_eq!(zones.len(), 1);
}

#[tokio::test]
async fn test_deactivation_of_zones_that_no_longer_qualify() {
    let stores = PipelineStores::in_memory_with(MemoryEventStore::with_events(twelve_lunch_orders()));
    let settings = PipelineSettings { deactivate_missing_zones: true, ..PipelineSettings::default() };
    let now = local(31, 12, 30);
    let orchestrator = BatchOrchestrator::new(stores, Arc::new(StubNarrator), settings)
        .with_clock(Arc::new(move || now));

    orchestrator.run_one(target()).await.unwrap();
    assert_eq!(orchestrator.stores().zones.list_active_zones().await.unwrap().len(), 1);

    // A month later the old orders have aged out of the window
    let later = NaiveDate::from_ymd_opt(2024, 7, 15).unwrap();
    let summary = orchestrator.run_one(later).await.unwrap();
    assert_eq!(summary.zones, 0);
    assert!(orchestrator.stores().zones.list_active_zones().await.unwrap().is_empty());
}
