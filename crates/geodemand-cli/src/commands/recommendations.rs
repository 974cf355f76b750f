//! Recommendations command implementation

use anyhow::{Context, Result};

use super::{resolve_date, warn_if_ephemeral, GlobalOptions};
use crate::cli::DateArgs;
use crate::config_loader::load_config;
use crate::output::OutputWriter;
use crate::output_types::{RecommendationRow, RecommendationsOutput};
use crate::storage::open_stores;

pub async fn execute(args: DateArgs, globals: &GlobalOptions, output: &OutputWriter) -> Result<()> {
    let config = load_config(globals.config.as_deref())?;
    let settings = config.pipeline_settings().context("Invalid pipeline configuration")?;
    let date = resolve_date(args.date, &settings)?;
    warn_if_ephemeral(globals, output);

    let stores = open_stores(globals.storage).await?;
    let recommendations = stores
        .forecasts
        .recommendations_for_date(date)
        .await
        .context("Failed to read recommendations")?;

    if output.is_json() {
        return output.result(RecommendationsOutput { date, recommendations });
    }

    output.section(format!("Recommendations ({})", date));
    output.table(recommendations.iter().map(RecommendationRow::from).collect());
    Ok(())
}
