//! geodemand CLI - Command-line interface
//!
//! Runs the demand prediction batch and inspects its results.

mod cli;
mod commands;
mod config_loader;
mod output;
mod output_types;
mod progress;
mod storage;

use anyhow::Result;
use clap::Parser;
use cli::Cli;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async { commands::execute(cli).await })?;

    Ok(())
}
