//! Run command implementation

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use geodemand_core::models::{DaySummary, RangeReport};
use geodemand_pipeline::BatchOrchestrator;

use super::import::read_events;
use super::GlobalOptions;
use crate::cli::RunArgs;
use crate::config_loader::{load_config_with_overrides, pipeline_parts};
use crate::output::OutputWriter;
use crate::output_types::DayRow;
use crate::progress::{create_spinner, finish_error, finish_success, RangeProgress};
use crate::storage::open_stores;

pub async fn execute(args: RunArgs, globals: &GlobalOptions, output: &OutputWriter) -> Result<()> {
    let config = load_config_with_overrides(globals.config.as_deref(), &args.tuning)?;
    let (settings, narrator) = pipeline_parts(&config)?;
    let stores = open_stores(globals.storage).await?;

    if let Some(path) = args.events.as_ref() {
        let events = read_events(path)?;
        let inserted = stores.events.insert_events(&events).await?;
        output.info(format!("Loaded {} events from {}", inserted, path.display()));
    }

    let orchestrator = BatchOrchestrator::new(stores, narrator, settings);

    match (args.from, args.to) {
        (Some(start), Some(end)) => run_range(&orchestrator, start, end, output).await,
        _ => run_single(&orchestrator, args.date, output).await,
    }
}

async fn run_single(
    orchestrator: &BatchOrchestrator,
    date: Option<NaiveDate>,
    output: &OutputWriter,
) -> Result<()> {
    let spinner = (!output.is_json()).then(|| create_spinner("Recomputing..."));

    let result = match date {
        Some(date) => orchestrator.run_one(date).await,
        None => orchestrator.run_yesterday().await,
    };

    let summary = match result {
        Ok(summary) => {
            if let Some(pb) = spinner.as_ref() {
                finish_success(pb, &format!("Recomputed {}", summary.date));
            }
            summary
        }
        Err(e) => {
            if let Some(pb) = spinner.as_ref() {
                finish_error(pb, "Recompute failed");
            }
            return Err(e).context("Recompute failed");
        }
    };

    print_days(output, std::slice::from_ref(&summary));
    output.result(&summary)
}

async fn run_range(
    orchestrator: &BatchOrchestrator,
    start: NaiveDate,
    end: NaiveDate,
    output: &OutputWriter,
) -> Result<()> {
    let total = orchestrator.validate_range(start, end)?;
    let progress = RangeProgress::new(total, output.is_json());

    let report: RangeReport = orchestrator
        .run_range_with_progress(start, end, |update| progress.update(&update))
        .await?;
    progress.finish(report.completed.len(), !report.is_success());

    print_days(output, &report.completed);
    output.result(&report)?;

    if let Some(failure) = report.failure.as_ref() {
        bail!("Recompute stopped at {}: {}", failure.date, failure.error);
    }
    Ok(())
}

fn print_days(output: &OutputWriter, days: &[DaySummary]) {
    if output.is_json() {
        return;
    }
    output.section("Recomputed days");
    output.table(days.iter().map(DayRow::from).collect());
}
