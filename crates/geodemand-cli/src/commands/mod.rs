//! Command implementations

mod config;
mod db;
mod heatmap;
mod import;
mod recommendations;
mod run;
mod runs;
mod zones;

use crate::cli::{Cli, Commands, StorageBackend};
use crate::output::OutputWriter;
use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use geodemand_core::config::PipelineSettings;
use std::path::PathBuf;

/// Flags shared by every command
pub struct GlobalOptions {
    pub storage: StorageBackend,
    pub config: Option<PathBuf>,
}

/// Execute a CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);
    let globals = GlobalOptions { storage: cli.storage, config: cli.config };

    match cli.command {
        Commands::Run(args) => run::execute(args, &globals, &output).await,
        Commands::Import(args) => import::execute(args, &globals, &output).await,
        Commands::Zones(args) => zones::execute(args, &globals, &output).await,
        Commands::Heatmap(args) => heatmap::execute(args, &globals, &output).await,
        Commands::Recommendations(args) => {
            recommendations::execute(args, &globals, &output).await
        }
        Commands::Runs(args) => runs::execute(args, &globals, &output).await,
        Commands::Config => config::execute(&globals, &output),
        Commands::Db(args) => db::execute(args, &globals, &output).await,
    }
}

/// The requested date, or yesterday in the configured local time
pub fn resolve_date(date: Option<NaiveDate>, settings: &PipelineSettings) -> Result<NaiveDate> {
    match date {
        Some(date) => Ok(date),
        None => Utc::now()
            .with_timezone(&settings.utc_offset)
            .date_naive()
            .pred_opt()
            .context("Calendar underflow"),
    }
}

/// In-memory stores start empty in every process
pub fn warn_if_ephemeral(globals: &GlobalOptions, output: &OutputWriter) {
    if globals.storage == StorageBackend::Memory {
        output.warning(
            "Using in-memory storage, which starts empty. Pass --storage postgres to read \
             results written by earlier runs.",
        );
    }
}
