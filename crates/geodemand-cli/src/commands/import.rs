//! Import command implementation

use anyhow::{Context, Result};
use geodemand_core::models::DeliveryEvent;
use geodemand_pipeline::BatchOrchestrator;
use std::fs;
use std::path::Path;

use super::GlobalOptions;
use crate::cli::ImportArgs;
use crate::config_loader::{load_config_with_overrides, pipeline_parts};
use crate::output::OutputWriter;
use crate::output_types::{DayRow, ImportOutput};
use crate::storage::open_stores;

pub async fn execute(
    args: ImportArgs,
    globals: &GlobalOptions,
    output: &OutputWriter,
) -> Result<()> {
    let config = load_config_with_overrides(globals.config.as_deref(), &args.tuning)?;
    let (settings, narrator) = pipeline_parts(&config)?;
    let stores = open_stores(globals.storage).await?;

    let events = read_events(&args.path)?;
    let inserted = stores
        .events
        .insert_events(&events)
        .await
        .context("Failed to store delivery events")?;

    tracing::info!(read = events.len(), inserted, path = %args.path.display(), "Imported events");

    let run = match args.run {
        Some(date) => {
            let orchestrator = BatchOrchestrator::new(stores, narrator, settings);
            let summary = orchestrator
                .run_one(date)
                .await
                .with_context(|| format!("Run for {} failed", date))?;
            Some(summary)
        }
        None => None,
    };

    if output.is_json() {
        output.result(ImportOutput {
            path: args.path.display().to_string(),
            read: events.len(),
            inserted,
            run,
        })?;
    } else {
        output.success(format!("Imported {} of {} events", inserted, events.len()));
        if let Some(summary) = run.as_ref() {
            output.section("Run");
            output.table(vec![DayRow::from(summary)]);
        }
    }

    Ok(())
}

/// Read a JSON array of delivery events
pub fn read_events(path: &Path) -> Result<Vec<DeliveryEvent>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read events file {}", path.display()))?;
    let events: Vec<DeliveryEvent> = serde_json::from_str(&content)
        .with_context(|| format!("Invalid events file {}", path.display()))?;
    Ok(events)
}
