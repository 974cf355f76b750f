//! PostgreSQL storage adapter implementation

pub mod config;
pub mod events;
pub mod forecasts;
pub mod migrations;
pub mod runs;
pub mod zones;

pub use config::PostgresConfig;
pub use migrations::{MigrationError, MigrationManager, MigrationStatus};

use geodemand_core::error::{GeodemandError, Result};
use sqlx::{postgres::PgPoolOptions, PgPool};

/// Rows per multi-row INSERT, well under the 65535 bind parameter limit
const INSERT_CHUNK_ROWS: usize = 1000;

/// PostgreSQL storage adapter
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
    config: PostgresConfig,
}

impl PostgresStore {
    /// Create a new PostgreSQL store with the given configuration
    pub async fn new(config: PostgresConfig) -> Result<Self> {
        config.validate()?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.database_url)
            .await
            .map_err(|e| GeodemandError::storage("connect", e))?;

        sqlx::query("SELECT 1")
            .fetch_one(&pool)
            .await
            .map_err(|e| GeodemandError::storage("connection test", e))?;

        let store = Self { pool, config };
        if store.config.auto_migrate {
            store.run_migrations().await?;
        }

        tracing::info!(
            max_connections = store.config.max_connections,
            "Connected to PostgreSQL"
        );
        Ok(store)
    }

    /// Create a new PostgreSQL store and run migrations
    pub async fn with_migrations(config: PostgresConfig) -> Result<Self> {
        let store = Self::new(config).await?;
        store.run_migrations().await?;
        Ok(store)
    }

    /// Run all pending migrations
    pub async fn run_migrations(&self) -> Result<()> {
        let manager = MigrationManager::new(self.pool.clone());
        manager.run_migrations().await.map_err(|e| GeodemandError::storage("migrate", e))
    }

    /// Check migration status
    pub async fn migration_status(&self) -> Result<Vec<MigrationStatus>> {
        let manager = MigrationManager::new(self.pool.clone());
        manager.check_status().await.map_err(|e| GeodemandError::storage("migration status", e))
    }

    /// Check if there are pending migrations
    pub async fn has_pending_migrations(&self) -> Result<bool> {
        let manager = MigrationManager::new(self.pool.clone());
        manager
            .has_pending_migrations()
            .await
            .map_err(|e| GeodemandError::storage("migration status", e))
    }

    /// Get the current schema version
    pub async fn current_version(&self) -> Result<Option<i64>> {
        let manager = MigrationManager::new(self.pool.clone());
        manager.current_version().await.map_err(|e| GeodemandError::storage("schema version", e))
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Get a reference to the configuration
    pub fn config(&self) -> &PostgresConfig {
        &self.config
    }

    /// Perform a health check on the database connection
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| GeodemandError::storage("health check", e))?;
        Ok(())
    }
}
