use async_trait::async_trait;
use geodemand_core::error::{GeodemandError, Result};
use geodemand_core::models::{Coordinate, DeliveryEvent, Earnings, EventId, EventQuery};
use sqlx::postgres::PgRow;
use sqlx::{Postgres, QueryBuilder, Row};
use uuid::Uuid;

use super::{PostgresStore, INSERT_CHUNK_ROWS};
use crate::ports::EventStore;

fn event_from_row(row: &PgRow) -> DeliveryEvent {
    DeliveryEvent {
        id: EventId(row.get::<Uuid, _>("id")),
        pickup: Coordinate::new(row.get("pickup_lat"), row.get("pickup_lng")),
        completed_at: row.get("completed_at"),
        earnings: Earnings {
            base_fee: row.get("base_fee"),
            tip: row.get("tip"),
            bonus: row.get("bonus"),
        },
        duration_minutes: row.get("duration_minutes"),
        rating: row.get("rating"),
    }
}

#[async_trait]
impl EventStore for PostgresStore {
    async fn insert_events(&self, events: &[DeliveryEvent]) -> Result<usize> {
        let op = "insert_events";
        let mut tx = self.pool.begin().await.map_err(|e| GeodemandError::storage(op, e))?;

        let mut inserted = 0;
        for chunk in events.chunks(INSERT_CHUNK_ROWS) {
            let mut builder = QueryBuilder::<Postgres>::new(
                "INSERT INTO delivery_events \
                 (id, pickup_lat, pickup_lng, completed_at, base_fee, tip, bonus, \
                 duration_minutes, rating) ",
            );
            builder.push_values(chunk, |mut row, event| {
                row.push_bind(event.id.0)
                    .push_bind(event.pickup.lat)
                    .push_bind(event.pickup.lng)
                    .push_bind(event.completed_at)
                    .push_bind(event.earnings.base_fee)
                    .push_bind(event.earnings.tip)
                    .push_bind(event.earnings.bonus)
                    .push_bind(event.duration_minutes)
                    .push_bind(event.rating);
            });
            builder.push(" ON CONFLICT (id) DO NOTHING");

            let result = builder
                .build()
                .execute(&mut *tx)
                .await
                .map_err(|e| GeodemandError::storage(op, e))?;
            inserted += result.rows_affected() as usize;
        }

        tx.commit().await.map_err(|e| GeodemandError::storage(op, e))?;
        Ok(inserted)
    }

    async fn events_in_window(&self, query: &EventQuery) -> Result<Vec<DeliveryEvent>> {
        let area = query.area;

        let rows = sqlx::query(
            r#"
            SELECT id, pickup_lat, pickup_lng, completed_at, base_fee, tip, bonus, duration_minutes, rating
            FROM delivery_events
            WHERE completed_at >= $1 AND completed_at < $2
              AND ($3::float8 IS NULL OR pickup_lat >= $3)
              AND ($4::float8 IS NULL OR pickup_lng >= $4)
              AND ($5::float8 IS NULL OR pickup_lat <= $5)
              AND ($6::float8 IS NULL OR pickup_lng <= $6)
            ORDER BY completed_at
            "#,
        )
        .bind(query.window.start)
        .bind(query.window.end)
        .bind(area.map(|a| a.min_lat))
        .bind(area.map(|a| a.min_lng))
        .bind(area.map(|a| a.max_lat))
        .bind(area.map(|a| a.max_lng))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| GeodemandError::storage("events_in_window", e))?;

        Ok(rows.iter().map(event_from_row).collect())
    }
}
