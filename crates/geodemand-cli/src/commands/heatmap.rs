//! Heatmap command implementation

use anyhow::{Context, Result};

use super::{resolve_date, warn_if_ephemeral, GlobalOptions};
use crate::cli::DateArgs;
use crate::config_loader::load_config;
use crate::output::OutputWriter;
use crate::output_types::{HeatmapOutput, HeatmapRow};
use crate::storage::open_stores;

pub async fn execute(args: DateArgs, globals: &GlobalOptions, output: &OutputWriter) -> Result<()> {
    let config = load_config(globals.config.as_deref())?;
    let settings = config.pipeline_settings().context("Invalid pipeline configuration")?;
    let date = resolve_date(args.date, &settings)?;
    warn_if_ephemeral(globals, output);

    let stores = open_stores(globals.storage).await?;
    let points =
        stores.forecasts.heatmap_for_date(date).await.context("Failed to read the heatmap")?;

    if output.is_json() {
        return output.result(HeatmapOutput { date, points });
    }

    output.section(format!("Heatmap ({}, {} points)", date, points.len()));
    output.table(points.iter().map(HeatmapRow::from).collect());
    Ok(())
}
