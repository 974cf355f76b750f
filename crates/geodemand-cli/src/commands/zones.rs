//! Zones command implementation

use anyhow::{Context, Result};
use geodemand_core::models::{HourlyPrediction, ZoneId};
use std::collections::HashMap;

use super::{resolve_date, warn_if_ephemeral, GlobalOptions};
use crate::cli::DateArgs;
use crate::config_loader::load_config;
use crate::output::OutputWriter;
use crate::output_types::{ZoneOutput, ZoneRow, ZonesOutput};
use crate::storage::open_stores;

pub async fn execute(args: DateArgs, globals: &GlobalOptions, output: &OutputWriter) -> Result<()> {
    let config = load_config(globals.config.as_deref())?;
    let settings = config.pipeline_settings().context("Invalid pipeline configuration")?;
    let date = resolve_date(args.date, &settings)?;
    warn_if_ephemeral(globals, output);

    let stores = open_stores(globals.storage).await?;
    let zones = stores.zones.list_active_zones().await.context("Failed to list zones")?;
    let predictions = stores
        .forecasts
        .hourly_predictions_for_date(date)
        .await
        .context("Failed to read hourly predictions")?;

    let mut by_zone: HashMap<ZoneId, Vec<HourlyPrediction>> = HashMap::new();
    for prediction in predictions {
        by_zone.entry(prediction.zone_id).or_default().push(prediction);
    }

    let zones: Vec<ZoneOutput> = zones
        .into_iter()
        .map(|zone| {
            let predictions = by_zone.remove(&zone.id).unwrap_or_default();
            ZoneOutput { zone, predictions }
        })
        .collect();

    if output.is_json() {
        return output.result(ZonesOutput { date, zones });
    }

    output.section(format!("Active zones ({})", date));
    output.table(zones.iter().map(|z| ZoneRow::new(&z.zone, &z.predictions)).collect());
    Ok(())
}
