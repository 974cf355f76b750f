//! PostgreSQL connection settings

use geodemand_core::config::parse_bool;
use geodemand_core::error::{GeodemandError, Result};
use std::time::Duration;

/// Pool size when `GEODEMAND_DB_MAX_CONNECTIONS` is unset
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Wait for a free connection when `GEODEMAND_DB_ACQUIRE_TIMEOUT_SECS` is unset
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

/// A day's recompute writes predictions, heatmap and recommendations concurrently
const MIN_CONNECTIONS_FOR_RECOMPUTE: u32 = 3;

/// Connection settings for [`super::PostgresStore`]
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    /// Apply pending migrations when the store connects
    pub auto_migrate: bool,
}

impl PostgresConfig {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
            auto_migrate: false,
        }
    }

    /// Read `DATABASE_URL` and the optional `GEODEMAND_DB_*` variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any variable source, e.g. a map in tests
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| GeodemandError::ConfigMissing { key: "DATABASE_URL".to_string() })?;
        let mut config = Self::new(database_url);

        if let Some(value) = lookup("GEODEMAND_DB_MAX_CONNECTIONS") {
            config.max_connections = parse_count("GEODEMAND_DB_MAX_CONNECTIONS", &value)?;
        }

        if let Some(value) = lookup("GEODEMAND_DB_ACQUIRE_TIMEOUT_SECS") {
            let secs = parse_count("GEODEMAND_DB_ACQUIRE_TIMEOUT_SECS", &value)?;
            config.acquire_timeout = Duration::from_secs(u64::from(secs));
        }

        if let Some(value) = lookup("GEODEMAND_DB_AUTO_MIGRATE") {
            config.auto_migrate = parse_bool(&value).map_err(|_| GeodemandError::ConfigInvalid {
                key: "GEODEMAND_DB_AUTO_MIGRATE".to_string(),
                reason: format!("'{}' is not a boolean", value),
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.database_url.trim().is_empty() {
            return Err(GeodemandError::ConfigInvalid {
                key: "DATABASE_URL".to_string(),
                reason: "cannot be empty".to_string(),
            });
        }

        if self.max_connections < MIN_CONNECTIONS_FOR_RECOMPUTE {
            return Err(GeodemandError::ConfigInvalid {
                key: "GEODEMAND_DB_MAX_CONNECTIONS".to_string(),
                reason: format!(
                    "{} is below the {} connections a recompute uses at once",
                    self.max_connections, MIN_CONNECTIONS_FOR_RECOMPUTE
                ),
            });
        }

        if self.acquire_timeout.is_zero() {
            return Err(GeodemandError::ConfigInvalid {
                key: "GEODEMAND_DB_ACQUIRE_TIMEOUT_SECS".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(())
    }
}

fn parse_count(key: &str, value: &str) -> Result<u32> {
    value.trim().parse().map_err(|_| GeodemandError::ConfigInvalid {
        key: key.to_string(),
        reason: format!("'{}' is not a non-negative integer", value),
    })
}
