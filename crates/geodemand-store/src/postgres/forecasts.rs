use async_trait::async_trait;
use chrono::NaiveDate;
use geodemand_core::error::{GeodemandError, Result};
use geodemand_core::models::{
    Coordinate, HeatmapPoint, HourlyPrediction, Impact, Recommendation, RecommendationKind, Trend,
    ZoneId,
};
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, Postgres, QueryBuilder, Row};
use std::str::FromStr;
use uuid::Uuid;

use super::{PostgresStore, INSERT_CHUNK_ROWS};
use crate::ports::ForecastStore;

fn parse_column<T: FromStr<Err = String>>(row: &PgRow, column: &str) -> Result<T> {
    let raw: String = row.get(column);
    raw.parse::<T>().map_err(GeodemandError::Serialization)
}

fn non_negative(value: i32) -> u32 {
    value.max(0) as u32
}

fn prediction_from_row(row: &PgRow) -> HourlyPrediction {
    HourlyPrediction {
        zone_id: ZoneId(row.get::<Uuid, _>("zone_id")),
        hour: row.get::<i16, _>("hour").clamp(0, 23) as u8,
        expected_calls: non_negative(row.get("expected_calls")),
        confidence: row.get("confidence"),
        prediction_date: row.get("prediction_date"),
        created_at: row.get("created_at"),
    }
}

fn heatmap_point_from_row(row: &PgRow) -> Result<HeatmapPoint> {
    Ok(HeatmapPoint {
        location: Coordinate::new(row.get("lat"), row.get("lng")),
        weight: row.get("weight"),
        recent_orders: non_negative(row.get("recent_orders")),
        avg_wait_minutes: non_negative(row.get("avg_wait_minutes")),
        trend: parse_column::<Trend>(row, "trend")?,
        target_date: row.get("target_date"),
        created_at: row.get("created_at"),
    })
}

fn recommendation_from_row(row: &PgRow) -> Result<Recommendation> {
    Ok(Recommendation {
        zone_id: ZoneId(row.get::<Uuid, _>("zone_id")),
        kind: parse_column::<RecommendationKind>(row, "kind")?,
        title: row.get("title"),
        description: row.get("description"),
        impact: parse_column::<Impact>(row, "impact")?,
        confidence: row.get("confidence"),
        target_date: row.get("target_date"),
        created_at: row.get("created_at"),
    })
}

async fn insert_predictions(
    conn: &mut PgConnection,
    date: NaiveDate,
    predictions: &[HourlyPrediction],
) -> std::result::Result<(), sqlx::Error> {
    for chunk in predictions.chunks(INSERT_CHUNK_ROWS) {
        let mut builder = QueryBuilder::<Postgres>::new(
            "INSERT INTO hourly_predictions \
             (zone_id, prediction_date, hour, expected_calls, confidence, created_at) ",
        );
        builder.push_values(chunk, |mut row, prediction| {
            row.push_bind(prediction.zone_id.0)
                .push_bind(date)
                .push_bind(i16::from(prediction.hour))
                .push_bind(prediction.expected_calls as i32)
                .push_bind(prediction.confidence)
                .push_bind(prediction.created_at);
        });
        builder.build().execute(&mut *conn).await?;
    }
    Ok(())
}

async fn insert_heatmap_points(
    conn: &mut PgConnection,
    date: NaiveDate,
    points: &[HeatmapPoint],
) -> std::result::Result<(), sqlx::Error> {
    for chunk in points.chunks(INSERT_CHUNK_ROWS) {
        let mut builder = QueryBuilder::<Postgres>::new(
            "INSERT INTO heatmap_points \
             (target_date, lat, lng, weight, recent_orders, avg_wait_minutes, trend, created_at) ",
        );
        builder.push_values(chunk, |mut row, point| {
            row.push_bind(date)
                .push_bind(point.location.lat)
                .push_bind(point.location.lng)
                .push_bind(point.weight)
                .push_bind(point.recent_orders as i32)
                .push_bind(point.avg_wait_minutes as i32)
                .push_bind(point.trend.as_str())
                .push_bind(point.created_at);
        });
        builder.build().execute(&mut *conn).await?;
    }
    Ok(())
}

async fn insert_recommendations(
    conn: &mut PgConnection,
    date: NaiveDate,
    recommendations: &[Recommendation],
) -> std::result::Result<(), sqlx::Error> {
    for chunk in recommendations.chunks(INSERT_CHUNK_ROWS) {
        let mut builder = QueryBuilder::<Postgres>::new(
            "INSERT INTO recommendations \
             (target_date, zone_id, kind, title, description, impact, confidence, created_at) ",
        );
        builder.push_values(chunk, |mut row, rec| {
            row.push_bind(date)
                .push_bind(rec.zone_id.0)
                .push_bind(rec.kind.as_str())
                .push_bind(rec.title.as_str())
                .push_bind(rec.description.as_str())
                .push_bind(rec.impact.as_str())
                .push_bind(rec.confidence)
                .push_bind(rec.created_at);
        });
        builder.build().execute(&mut *conn).await?;
    }
    Ok(())
}

#[async_trait]
impl ForecastStore for PostgresStore {
    async fn replace_hourly_predictions(
        &self,
        zone_id: ZoneId,
        date: NaiveDate,
        predictions: &[HourlyPrediction],
    ) -> Result<()> {
        self.replace_hourly_predictions_for_zones(date, &[zone_id], predictions).await
    }

    async fn replace_hourly_predictions_for_zones(
        &self,
        date: NaiveDate,
        zone_ids: &[ZoneId],
        predictions: &[HourlyPrediction],
    ) -> Result<()> {
        let op = "replace_hourly_predictions";
        if let Some(stray) = predictions.iter().find(|p| !zone_ids.contains(&p.zone_id)) {
            return Err(GeodemandError::storage(
                op,
                format!("prediction for unlisted zone {}", stray.zone_id),
            ));
        }

        let ids: Vec<Uuid> = zone_ids.iter().map(|id| id.0).collect();
        let mut tx = self.pool.begin().await.map_err(|e| GeodemandError::storage(op, e))?;

        sqlx::query(
            "DELETE FROM hourly_predictions WHERE prediction_date = $1 AND zone_id = ANY($2)",
        )
        .bind(date)
        .bind(&ids)
        .execute(&mut *tx)
        .await
        .map_err(|e| GeodemandError::storage(op, e))?;

        insert_predictions(&mut tx, date, predictions)
            .await
            .map_err(|e| GeodemandError::storage(op, e))?;

        tx.commit().await.map_err(|e| GeodemandError::storage(op, e))
    }

    async fn hourly_predictions_for_date(&self, date: NaiveDate) -> Result<Vec<HourlyPrediction>> {
        let rows = sqlx::query(
            r#"
            SELECT zone_id, prediction_date, hour, expected_calls, confidence, created_at
            FROM hourly_predictions
            WHERE prediction_date = $1
            ORDER BY zone_id, hour
            "#,
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| GeodemandError::storage("hourly_predictions_for_date", e))?;

        Ok(rows.iter().map(prediction_from_row).collect())
    }

    async fn replace_heatmap(&self, date: NaiveDate, points: &[HeatmapPoint]) -> Result<()> {
        let op = "replace_heatmap";
        let mut tx = self.pool.begin().await.map_err(|e| GeodemandError::storage(op, e))?;

        sqlx::query("DELETE FROM heatmap_points WHERE target_date = $1")
            .bind(date)
            .execute(&mut *tx)
            .await
            .map_err(|e| GeodemandError::storage(op, e))?;

        insert_heatmap_points(&mut tx, date, points)
            .await
            .map_err(|e| GeodemandError::storage(op, e))?;

        tx.commit().await.map_err(|e| GeodemandError::storage(op, e))
    }

    async fn heatmap_for_date(&self, date: NaiveDate) -> Result<Vec<HeatmapPoint>> {
        let rows = sqlx::query(
            r#"
            SELECT target_date, lat, lng, weight, recent_orders, avg_wait_minutes, trend, created_at
            FROM heatmap_points
            WHERE target_date = $1
            ORDER BY recent_orders DESC, id
            "#,
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| GeodemandError::storage("heatmap_for_date", e))?;

        rows.iter().map(heatmap_point_from_row).collect()
    }

    async fn replace_recommendations(
        &self,
        date: NaiveDate,
        recommendations: &[Recommendation],
    ) -> Result<()> {
        let op = "replace_recommendations";
        let mut tx = self.pool.begin().await.map_err(|e| GeodemandError::storage(op, e))?;

        sqlx::query("DELETE FROM recommendations WHERE target_date = $1")
            .bind(date)
            .execute(&mut *tx)
            .await
            .map_err(|e| GeodemandError::storage(op, e))?;

        insert_recommendations(&mut tx, date, recommendations)
            .await
            .map_err(|e| GeodemandError::storage(op, e))?;

        tx.commit().await.map_err(|e| GeodemandError::storage(op, e))
    }

    async fn recommendations_for_date(&self, date: NaiveDate) -> Result<Vec<Recommendation>> {
        let rows = sqlx::query(
            r#"
            SELECT target_date, zone_id, kind, title, description, impact, confidence, created_at
            FROM recommendations
            WHERE target_date = $1
            ORDER BY id
            "#,
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| GeodemandError::storage("recommendations_for_date", e))?;

        rows.iter().map(recommendation_from_row).collect()
    }
}
