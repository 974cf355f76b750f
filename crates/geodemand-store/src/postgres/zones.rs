use async_trait::async_trait;
use geodemand_core::error::{GeodemandError, Result};
use geodemand_core::models::{Coordinate, Zone, ZoneId};
use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

use super::PostgresStore;
use crate::ports::ZoneStore;

const ZONE_COLUMNS: &str = "id, cell_key, name, footprint, expected_calls, avg_fee, confidence, \
                            is_active, created_at, updated_at";

fn zone_from_row(row: &PgRow) -> Result<Zone> {
    let footprint_json: serde_json::Value = row.get("footprint");
    let footprint: Vec<Coordinate> = serde_json::from_value(footprint_json)
        .map_err(|e| GeodemandError::Serialization(format!("Invalid zone footprint: {}", e)))?;

    Ok(Zone {
        id: ZoneId(row.get::<Uuid, _>("id")),
        cell_key: row.get("cell_key"),
        name: row.get("name"),
        footprint,
        expected_calls: row.get::<i32, _>("expected_calls").max(0) as u32,
        avg_fee: row.get("avg_fee"),
        confidence: row.get("confidence"),
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn footprint_json(zone: &Zone) -> Result<serde_json::Value> {
    serde_json::to_value(&zone.footprint)
        .map_err(|e| GeodemandError::Serialization(format!("Failed to encode footprint: {}", e)))
}

#[async_trait]
impl ZoneStore for PostgresStore {
    async fn find_zone_by_key(&self, cell_key: &str) -> Result<Option<Zone>> {
        let row = sqlx::query(&format!("SELECT {} FROM zones WHERE cell_key = $1", ZONE_COLUMNS))
            .bind(cell_key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| GeodemandError::storage("find_zone_by_key", e))?;

        row.as_ref().map(zone_from_row).transpose()
    }

    async fn insert_zone(&self, zone: &Zone) -> Result<ZoneId> {
        sqlx::query(
            r#"
            INSERT INTO zones
                (id, cell_key, name, footprint, expected_calls, avg_fee, confidence, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(zone.id.0)
        .bind(&zone.cell_key)
        .bind(&zone.name)
        .bind(footprint_json(zone)?)
        .bind(zone.expected_calls as i32)
        .bind(zone.avg_fee)
        .bind(zone.confidence)
        .bind(zone.is_active)
        .bind(zone.created_at)
        .bind(zone.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| GeodemandError::storage("insert_zone", e))?;

        Ok(zone.id)
    }

    async fn update_zone(&self, zone: &Zone) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE zones
            SET name = $2,
                footprint = $3,
                expected_calls = $4,
                avg_fee = $5,
                confidence = $6,
                is_active = $7,
                updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(zone.id.0)
        .bind(&zone.name)
        .bind(footprint_json(zone)?)
        .bind(zone.expected_calls as i32)
        .bind(zone.avg_fee)
        .bind(zone.confidence)
        .bind(zone.is_active)
        .bind(zone.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| GeodemandError::storage("update_zone", e))?;

        if result.rows_affected() == 0 {
            return Err(GeodemandError::ZoneNotFound { key: zone.cell_key.clone() });
        }
        Ok(())
    }

    async fn list_active_zones(&self) -> Result<Vec<Zone>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM zones WHERE is_active ORDER BY avg_fee DESC, cell_key",
            ZONE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| GeodemandError::storage("list_active_zones", e))?;

        rows.iter().map(zone_from_row).collect()
    }

    async fn deactivate_zones(&self, keep: &[ZoneId]) -> Result<usize> {
        let keep_ids: Vec<Uuid> = keep.iter().map(|id| id.0).collect();

        let result = sqlx::query(
            r#"
            UPDATE zones
            SET is_active = FALSE, updated_at = NOW()
            WHERE is_active AND NOT (id = ANY($1))
            "#,
        )
        .bind(&keep_ids)
        .execute(&self.pool)
        .await
        .map_err(|e| GeodemandError::storage("deactivate_zones", e))?;

        Ok(result.rows_affected() as usize)
    }
}
