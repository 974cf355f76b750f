//! Database management commands

use anyhow::{bail, Context, Result};

use super::GlobalOptions;
use crate::cli::{DbArgs, DbCommand, StorageBackend};
use crate::output::OutputWriter;
use crate::output_types::{MigrationOutput, MigrationRow};
use crate::storage::connect_postgres;

pub async fn execute(args: DbArgs, globals: &GlobalOptions, output: &OutputWriter) -> Result<()> {
    if globals.storage != StorageBackend::Postgres {
        bail!("Database commands need --storage postgres");
    }

    let store = connect_postgres(false).await?;

    match args.command {
        DbCommand::Migrate => {
            let before = store.current_version().await.context("Failed to read schema version")?;
            store.run_migrations().await.context("Failed to apply migrations")?;
            let after = store.current_version().await.context("Failed to read schema version")?;

            if output.is_json() {
                return output.result(serde_json::json!({
                    "previous_version": before,
                    "current_version": after,
                }));
            }

            if before == after {
                output.info("Schema is up to date");
            } else {
                output.success(format!(
                    "Migrated schema from {} to {}",
                    format_version(before),
                    format_version(after)
                ));
            }
            Ok(())
        }
        DbCommand::Status => {
            let statuses: Vec<MigrationOutput> = store
                .migration_status()
                .await
                .context("Failed to read migration status")?
                .iter()
                .map(MigrationOutput::from)
                .collect();

            if output.is_json() {
                return output.result(&statuses);
            }

            output.section("Migrations");
            output.table(statuses.iter().map(MigrationRow::from).collect());

            let pending = statuses.iter().filter(|s| !s.applied).count();
            if pending > 0 {
                output.warning(format!(
                    "{} pending migration(s). Run: geodemand db migrate --storage postgres",
                    pending
                ));
            }
            Ok(())
        }
    }
}

fn format_version(version: Option<i64>) -> String {
    version.map(|v| v.to_string()).unwrap_or_else(|| "empty".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_version() {
        assert_eq!(format_version(None), "empty");
        assert_eq!(format_version(Some(20240601000001)), "20240601000001");
    }
}
