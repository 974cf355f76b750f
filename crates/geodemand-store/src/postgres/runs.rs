use async_trait::async_trait;
use geodemand_core::error::{GeodemandError, Result};
use geodemand_core::models::{DaySummary, RunId, RunRecord, RunStatus, RunTrigger};
use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

use super::PostgresStore;
use crate::ports::RunLogStore;

const RUN_COLUMNS: &str =
    "run_id, trigger, status, start_date, end_date, days, error, started_at, finished_at";

fn run_from_row(row: &PgRow) -> Result<RunRecord> {
    let trigger: String = row.get("trigger");
    let status: String = row.get("status");
    let days: serde_json::Value = row.get("days");

    Ok(RunRecord {
        run_id: RunId(row.get::<Uuid, _>("run_id")),
        trigger: trigger.parse::<RunTrigger>().map_err(GeodemandError::Serialization)?,
        status: status.parse::<RunStatus>().map_err(GeodemandError::Serialization)?,
        start_date: row.get("start_date"),
        end_date: row.get("end_date"),
        days: serde_json::from_value::<Vec<DaySummary>>(days)
            .map_err(|e| GeodemandError::Serialization(format!("Invalid run days: {}", e)))?,
        error: row.get("error"),
        started_at: row.get("started_at"),
        finished_at: row.get("finished_at"),
    })
}

#[async_trait]
impl RunLogStore for PostgresStore {
    async fn record_run(&self, record: &RunRecord) -> Result<()> {
        let days = serde_json::to_value(&record.days)
            .map_err(|e| GeodemandError::Serialization(format!("Failed to encode run days: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO batch_runs
                (run_id, trigger, status, start_date, end_date, days, error, started_at, finished_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (run_id) DO UPDATE
            SET status = EXCLUDED.status,
                days = EXCLUDED.days,
                error = EXCLUDED.error,
                finished_at = EXCLUDED.finished_at
            "#,
        )
        .bind(record.run_id.0)
        .bind(record.trigger.as_str())
        .bind(record.status.as_str())
        .bind(record.start_date)
        .bind(record.end_date)
        .bind(days)
        .bind(&record.error)
        .bind(record.started_at)
        .bind(record.finished_at)
        .execute(&self.pool)
        .await
        .map_err(|e| GeodemandError::storage("record_run", e))?;

        Ok(())
    }

    async fn get_run(&self, run_id: RunId) -> Result<Option<RunRecord>> {
        let row =
            sqlx::query(&format!("SELECT {} FROM batch_runs WHERE run_id = $1", RUN_COLUMNS))
                .bind(run_id.0)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| GeodemandError::storage("get_run", e))?;

        row.as_ref().map(run_from_row).transpose()
    }

    async fn recent_runs(&self, limit: usize) -> Result<Vec<RunRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM batch_runs ORDER BY started_at DESC LIMIT $1",
            RUN_COLUMNS
        ))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| GeodemandError::storage("recent_runs", e))?;

        rows.iter().map(run_from_row).collect()
    }
}
