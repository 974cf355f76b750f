//! Runs command implementation

use anyhow::{Context, Result};

use super::{warn_if_ephemeral, GlobalOptions};
use crate::cli::RunsArgs;
use crate::output::OutputWriter;
use crate::output_types::RunRow;
use crate::storage::open_stores;

const MAX_RUNS: usize = 100;

pub async fn execute(args: RunsArgs, globals: &GlobalOptions, output: &OutputWriter) -> Result<()> {
    warn_if_ephemeral(globals, output);

    let stores = open_stores(globals.storage).await?;
    let limit = args.limit.clamp(1, MAX_RUNS);
    let runs = stores.runs.recent_runs(limit).await.context("Failed to read the run log")?;

    if output.is_json() {
        return output.result(&runs);
    }

    output.section("Recent runs");
    output.table(runs.iter().map(RunRow::from).collect());

    for run in &runs {
        if let Some(error) = run.error.as_ref() {
            output.warning(format!("{} failed: {}", run.run_id, error));
        }
    }
    Ok(())
}
