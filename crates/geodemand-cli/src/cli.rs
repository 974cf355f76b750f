use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// geodemand - Delivery demand prediction
#[derive(Parser, Debug)]
#[command(name = "geodemand")]
#[command(about = "Hot zones and hourly forecasts from delivery history", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Storage backend to use (memory or postgres)
    #[arg(long, global = true, default_value = "memory")]
    pub storage: StorageBackend,

    /// Configuration file (defaults to ./geodemand.toml when present)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Storage backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum StorageBackend {
    /// In-memory storage (default, lost when the command exits)
    Memory,
    /// PostgreSQL persistent storage
    Postgres,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Recompute predictions for one date or a range of dates
    Run(RunArgs),

    /// Load delivery events from a JSON file
    Import(ImportArgs),

    /// Show active zones and their hourly predictions
    Zones(DateArgs),

    /// Show the demand heatmap
    Heatmap(DateArgs),

    /// Show recommendations
    Recommendations(DateArgs),

    /// Show recent batch runs
    Runs(RunsArgs),

    /// Show the resolved configuration and where each value came from
    Config,

    /// Manage the database
    Db(DbArgs),
}

/// Overrides shared by every command that computes predictions
#[derive(Parser, Debug, Default, Clone)]
pub struct TuningArgs {
    /// Narrator to use ("ollama:<model>" or "offline")
    #[arg(long)]
    pub narrator: Option<String>,

    /// Minimum orders for a cell to become a zone
    #[arg(long)]
    pub min_orders: Option<u32>,

    /// Maximum number of zones kept per run
    #[arg(long)]
    pub max_zones: Option<usize>,

    /// Days of history used for zones and hourly forecasts
    #[arg(long)]
    pub zone_window_days: Option<u32>,

    /// Days of history used for the heatmap
    #[arg(long)]
    pub heatmap_window_days: Option<u32>,
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Target date (YYYY-MM-DD). Defaults to yesterday.
    #[arg(long, conflicts_with_all = ["from", "to"])]
    pub date: Option<NaiveDate>,

    /// First date of a range
    #[arg(long, requires = "to")]
    pub from: Option<NaiveDate>,

    /// End of a range (exclusive)
    #[arg(long, requires = "from")]
    pub to: Option<NaiveDate>,

    /// Load events from this JSON file before running
    #[arg(long, value_name = "PATH")]
    pub events: Option<PathBuf>,

    #[command(flatten)]
    pub tuning: TuningArgs,
}

#[derive(Parser, Debug)]
pub struct ImportArgs {
    /// JSON file holding an array of delivery events
    pub path: PathBuf,

    /// Recompute this date after importing
    #[arg(long, value_name = "DATE")]
    pub run: Option<NaiveDate>,

    #[command(flatten)]
    pub tuning: TuningArgs,
}

#[derive(Parser, Debug)]
pub struct DateArgs {
    /// Target date (YYYY-MM-DD). Defaults to yesterday.
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

#[derive(Parser, Debug)]
pub struct RunsArgs {
    /// Maximum number of runs to show
    #[arg(long, short = 'n', default_value = "20")]
    pub limit: usize,
}

#[derive(Parser, Debug)]
pub struct DbArgs {
    /// Database management command
    #[command(subcommand)]
    pub command: DbCommand,
}

#[derive(Subcommand, Debug)]
pub enum DbCommand {
    /// Apply pending migrations
    Migrate,

    /// Show applied and pending migrations
    Status,
}
