use chrono::{DateTime, NaiveDate, Timelike, Utc};
use geodemand_core::config::PipelineSettings;
use geodemand_core::error::{GeodemandError, Result};
use geodemand_core::models::{
    DayFailure, DaySummary, EventQuery, RangeReport, RunId, RunRecord, RunTrigger, TimeWindow,
    ZoneWithPredictions,
};
use geodemand_geo::grid::Resolution;
use geodemand_llm::Narrator;
use geodemand_store::postgres::PostgresStore;
use geodemand_store::{
    EventStore, ForecastStore, MemoryEventStore, MemoryForecastStore, MemoryRunLog,
    MemoryZoneStore, RunLogStore, ZoneStore,
};
use std::sync::Arc;
use std::time::Instant;

use crate::aggregate::aggregate;
use crate::heatmap::HeatmapBuilder;
use crate::hourly::HourlyForecaster;
use crate::recommend::RecommendationComposer;
use crate::zones::{select_zones, SelectionParams, ZoneSynchronizer};

/// Source of the current instant, used for trend and recommendation hours
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// The storage ports a pipeline run reads from and writes to
#[derive(Clone)]
pub struct PipelineStores {
    pub events: Arc<dyn EventStore>,
    pub zones: Arc<dyn ZoneStore>,
    pub forecasts: Arc<dyn ForecastStore>,
    pub runs: Arc<dyn RunLogStore>,
}

impl PipelineStores {
    /// Fresh in-memory stores
    pub fn in_memory() -> Self {
        Self::in_memory_with(MemoryEventStore::new())
    }

    /// In-memory stores over an existing event store
    pub fn in_memory_with(events: MemoryEventStore) -> Self {
        Self {
            events: Arc::new(events),
            zones: Arc::new(MemoryZoneStore::new()),
            forecasts: Arc::new(MemoryForecastStore::new()),
            runs: Arc::new(MemoryRunLog::new()),
        }
    }

    /// Every port backed by the same PostgreSQL pool
    pub fn postgres(store: PostgresStore) -> Self {
        Self {
            events: Arc::new(store.clone()),
            zones: Arc::new(store.clone()),
            forecasts: Arc::new(store.clone()),
            runs: Arc::new(store),
        }
    }
}

/// Progress information for multi-day runs
#[derive(Debug, Clone)]
pub struct DayProgress {
    pub phase: DayPhase,
    pub date: NaiveDate,
    /// Zero-based position of `date` in the run
    pub current: usize,
    pub total: usize,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayPhase {
    Started,
    Completed,
    Failed,
}

/// Runs the daily demand computation and records every run in the run log
pub struct BatchOrchestrator {
    stores: PipelineStores,
    narrator: Arc<dyn Narrator>,
    settings: PipelineSettings,
    clock: Clock,
}

impl BatchOrchestrator {
    pub fn new(
        stores: PipelineStores,
        narrator: Arc<dyn Narrator>,
        settings: PipelineSettings,
    ) -> Self {
        Self { stores, narrator, settings, clock: Arc::new(Utc::now) }
    }

    /// Replace the wall clock, e.g. to pin the trend hour in tests
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn stores(&self) -> &PipelineStores {
        &self.stores
    }

    /// Today's date in the configured local offset
    pub fn today(&self) -> NaiveDate {
        (self.clock)().with_timezone(&self.settings.utc_offset).date_naive()
    }

    /// Check a half-open `[start, end)` range and return its length in days
    pub fn validate_range(&self, start: NaiveDate, end: NaiveDate) -> Result<usize> {
        if end <= start {
            return Err(GeodemandError::InvalidDateRange {
                start,
                end,
                reason: "end must be after start".to_string(),
            });
        }

        let days = (end - start).num_days();
        let max = i64::from(self.settings.max_range_days);
        if days > max {
            return Err(GeodemandError::RangeTooLong { days, max });
        }

        // Windows reach back from the first day and forward past the last
        self.windows(start)?;
        self.windows(end.pred_opt().unwrap_or(start))?;

        Ok(days as usize)
    }

    /// Check that `date` and its history windows can be computed, returning the day after
    pub fn validate_date(&self, date: NaiveDate) -> Result<NaiveDate> {
        self.windows(date)?;
        next_day(date)
    }

    /// Zone and heatmap history windows ending on `date`
    fn windows(&self, date: NaiveDate) -> Result<(TimeWindow, TimeWindow)> {
        let settings = &self.settings;
        Ok((
            TimeWindow::ending_on(date, settings.zone_window_days, settings.utc_offset)?,
            TimeWindow::ending_on(date, settings.heatmap_window_days, settings.utc_offset)?,
        ))
    }

    /// Recompute a single date
    pub async fn run_one(&self, date: NaiveDate) -> Result<DaySummary> {
        self.run_single(RunTrigger::OnDemand, date).await
    }

    /// Recompute the day before today, as a scheduler would
    pub async fn run_yesterday(&self) -> Result<DaySummary> {
        let today = self.today();
        let yesterday = today.pred_opt().ok_or_else(|| GeodemandError::InvalidDate {
            value: today.to_string(),
        })?;
        self.run_single(RunTrigger::Scheduled, yesterday).await
    }

    /// Recompute every date in `[start, end)`
    pub async fn run_range(&self, start: NaiveDate, end: NaiveDate) -> Result<RangeReport> {
        self.run_range_with_progress(start, end, |_| {}).await
    }

    /// Recompute every date in `[start, end)` with progress reporting.
    ///
    /// Days run one after another. The first failing day stops the run;
    /// days completed before it stay written. Validation errors are
    /// returned before anything is recorded.
    pub async fn run_range_with_progress<F>(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        mut progress: F,
    ) -> Result<RangeReport>
    where
        F: FnMut(DayProgress) + Send,
    {
        let days = self.validate_range(start, end)?;
        let mut record = self.begin(RunTrigger::Backfill, start, end).await?;

        let report = self.run_days(start, days, &mut progress).await;
        self.close(&mut record, &report).await?;

        Ok(report)
    }

    /// Start recomputing `date` in a background task.
    ///
    /// Returns as soon as the run is recorded. Poll the run log with the
    /// returned id to follow it.
    pub async fn spawn_one(self: &Arc<Self>, date: NaiveDate) -> Result<RunId> {
        let end = self.validate_date(date)?;
        let mut record = self.begin(RunTrigger::OnDemand, date, end).await?;
        let run_id = record.run_id;

        let orchestrator = Arc::clone(self);
        tokio::spawn(async move {
            let report = orchestrator.run_days(date, 1, &mut |_: DayProgress| {}).await;
            // close() already logs its own failure
            let _ = orchestrator.close(&mut record, &report).await;
        });

        Ok(run_id)
    }

    async fn run_single(&self, trigger: RunTrigger, date: NaiveDate) -> Result<DaySummary> {
        let end = self.validate_date(date)?;
        let mut record = self.begin(trigger, date, end).await?;

        let result = self.run_day(date).await;
        let report = match &result {
            Ok(summary) => RangeReport { completed: vec![summary.clone()], failure: None },
            Err(e) => {
                tracing::error!(%date, error = %e, "Day recompute failed");
                RangeReport {
                    completed: Vec::new(),
                    failure: Some(DayFailure { date, error: e.to_string() }),
                }
            }
        };

        let closed = self.close(&mut record, &report).await;
        let summary = result?;
        closed?;
        Ok(summary)
    }

    async fn begin(
        &self,
        trigger: RunTrigger,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RunRecord> {
        let record = RunRecord::started(trigger, start, end);
        self.stores.runs.record_run(&record).await?;
        tracing::info!(
            run_id = %record.run_id,
            trigger = trigger.as_str(),
            %start,
            %end,
            "Batch run started"
        );
        Ok(record)
    }

    async fn close(&self, record: &mut RunRecord, report: &RangeReport) -> Result<()> {
        record.finish(report);
        if let Err(e) = self.stores.runs.record_run(record).await {
            tracing::error!(run_id = %record.run_id, error = %e, "Failed to record run result");
            return Err(e);
        }
        tracing::info!(
            run_id = %record.run_id,
            status = record.status.as_str(),
            days = report.completed.len(),
            "Batch run finished"
        );
        Ok(())
    }

    async fn run_days<F>(&self, start: NaiveDate, days: usize, progress: &mut F) -> RangeReport
    where
        F: FnMut(DayProgress) + Send,
    {
        let mut report = RangeReport::default();

        for (current, date) in start.iter_days().take(days).enumerate() {
            progress(DayProgress {
                phase: DayPhase::Started,
                date,
                current,
                total: days,
                message: format!("Recomputing {}", date),
            });

            match self.run_day(date).await {
                Ok(summary) => {
                    progress(DayProgress {
                        phase: DayPhase::Completed,
                        date,
                        current,
                        total: days,
                        message: format!(
                            "{} zones, {} predictions, {} heatmap points, {} recommendations",
                            summary.zones,
                            summary.predictions,
                            summary.heatmap_points,
                            summary.recommendations
                        ),
                    });
                    report.completed.push(summary);
                }
                Err(e) => {
                    tracing::error!(%date, error = %e, "Day recompute failed, stopping run");
                    progress(DayProgress {
                        phase: DayPhase::Failed,
                        date,
                        current,
                        total: days,
                        message: e.to_string(),
                    });
                    report.failure = Some(DayFailure { date, error: e.to_string() });
                    break;
                }
            }
        }

        report
    }

    /// Compute and store every output for one target date
    async fn run_day(&self, date: NaiveDate) -> Result<DaySummary> {
        let settings = &self.settings;
        let offset = settings.utc_offset;
        let now = (self.clock)();
        let started = Instant::now();

        tracing::info!(%date, "Day recompute started");

        let (zone_window, heatmap_window) = self.windows(date)?;
        let fetch_window = if zone_window.start <= heatmap_window.start {
            zone_window
        } else {
            heatmap_window
        };

        let events = self
            .stores
            .events
            .events_in_window(&EventQuery::new(fetch_window).within(settings.service_area))
            .await?;

        // Zones first: forecasts and recommendations read the active set
        let cells =
            aggregate(&events, &zone_window, Resolution::COARSE, &settings.service_area, offset);
        let candidates = select_zones(&cells, &SelectionParams::from_settings(settings));
        let zones_written =
            ZoneSynchronizer::new(self.stores.zones.clone(), self.narrator.clone())
                .with_deactivation(settings.deactivate_missing_zones)
                .reconcile(&candidates)
                .await?;

        let active = self.stores.zones.list_active_zones().await?;

        let forecaster = HourlyForecaster::new(self.stores.forecasts.clone(), offset);
        let zones_with_predictions: Vec<ZoneWithPredictions> = active
            .into_iter()
            .map(|zone| {
                let predictions = forecaster.forecast(&zone, &events, &zone_window, date, now);
                ZoneWithPredictions { zone, predictions }
            })
            .collect();

        let heatmap =
            HeatmapBuilder::new(self.stores.forecasts.clone(), settings.service_area, offset);
        let points = heatmap.build(&events, &heatmap_window, date, now);

        let composer =
            RecommendationComposer::new(self.stores.forecasts.clone(), self.narrator.clone());
        let current_hour = now.with_timezone(&offset).hour() as usize;

        let (predictions, heatmap_points, recommendations) = tokio::try_join!(
            forecaster.persist_day(date, &zones_with_predictions),
            async {
                heatmap.persist(date, &points).await?;
                Ok::<usize, GeodemandError>(points.len())
            },
            async {
                let recommendations =
                    composer.compose(&zones_with_predictions, current_hour, date, now).await;
                composer.persist(date, &recommendations).await?;
                Ok::<usize, GeodemandError>(recommendations.len())
            },
        )?;

        let summary =
            DaySummary { date, zones: zones_written, predictions, heatmap_points, recommendations };

        tracing::info!(
            %date,
            events = events.len(),
            zones = summary.zones,
            predictions = summary.predictions,
            heatmap_points = summary.heatmap_points,
            recommendations = summary.recommendations,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Day recompute finished"
        );

        Ok(summary)
    }
}

fn next_day(date: NaiveDate) -> Result<NaiveDate> {
    date.succ_opt().ok_or_else(|| GeodemandError::InvalidDate { value: date.to_string() })
}
