use chrono::NaiveDate;
use geodemand_core::models::{
    DaySummary, HeatmapPoint, HourlyPrediction, Recommendation, RunRecord, Zone,
};
use geodemand_store::postgres::MigrationStatus;
use serde::Serialize;
use tabled::Tabled;

/// Output for the import command
#[derive(Debug, Serialize)]
pub struct ImportOutput {
    pub path: String,
    pub read: usize,
    pub inserted: usize,
    pub run: Option<DaySummary>,
}

/// Output for the zones command
#[derive(Debug, Serialize)]
pub struct ZonesOutput {
    pub date: NaiveDate,
    pub zones: Vec<ZoneOutput>,
}

#[derive(Debug, Serialize)]
pub struct ZoneOutput {
    #[serde(flatten)]
    pub zone: Zone,
    pub predictions: Vec<HourlyPrediction>,
}

#[derive(Tabled)]
pub struct ZoneRow {
    #[tabled(rename = "Zone")]
    pub name: String,
    #[tabled(rename = "Cell")]
    pub cell_key: String,
    #[tabled(rename = "Calls/day")]
    pub expected_calls: u32,
    #[tabled(rename = "Avg fee")]
    pub avg_fee: String,
    #[tabled(rename = "Confidence")]
    pub confidence: String,
    #[tabled(rename = "Peak hour")]
    pub peak_hour: String,
}

impl ZoneRow {
    pub fn new(zone: &Zone, predictions: &[HourlyPrediction]) -> Self {
        let peak = predictions
            .iter()
            .filter(|p| p.expected_calls > 0)
            .max_by(|a, b| a.expected_calls.cmp(&b.expected_calls).then(b.hour.cmp(&a.hour)));

        Self {
            name: zone.name.clone(),
            cell_key: zone.cell_key.clone(),
            expected_calls: zone.expected_calls,
            avg_fee: format!("{:.0}", zone.avg_fee),
            confidence: format!("{:.2}", zone.confidence),
            peak_hour: peak
                .map(|p| format!("{:02}:00 ({})", p.hour, p.expected_calls))
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

/// Output for the heatmap command
#[derive(Debug, Serialize)]
pub struct HeatmapOutput {
    pub date: NaiveDate,
    pub points: Vec<HeatmapPoint>,
}

#[derive(Tabled)]
pub struct HeatmapRow {
    #[tabled(rename = "Lat")]
    pub lat: String,
    #[tabled(rename = "Lng")]
    pub lng: String,
    #[tabled(rename = "Orders")]
    pub orders: u32,
    #[tabled(rename = "Weight")]
    pub weight: String,
    #[tabled(rename = "Wait (min)")]
    pub wait: u32,
    #[tabled(rename = "Trend")]
    pub trend: String,
}

impl From<&HeatmapPoint> for HeatmapRow {
    fn from(point: &HeatmapPoint) -> Self {
        Self {
            lat: format!("{:.4}", point.location.lat),
            lng: format!("{:.4}", point.location.lng),
            orders: point.recent_orders,
            weight: format!("{:.2}", point.weight),
            wait: point.avg_wait_minutes,
            trend: point.trend.to_string(),
        }
    }
}

/// Output for the recommendations command
#[derive(Debug, Serialize)]
pub struct RecommendationsOutput {
    pub date: NaiveDate,
    pub recommendations: Vec<Recommendation>,
}

#[derive(Tabled)]
pub struct RecommendationRow {
    #[tabled(rename = "Kind")]
    pub kind: String,
    #[tabled(rename = "Title")]
    pub title: String,
    #[tabled(rename = "Impact")]
    pub impact: String,
    #[tabled(rename = "Confidence")]
    pub confidence: String,
    #[tabled(rename = "Description")]
    pub description: String,
}

impl From<&Recommendation> for RecommendationRow {
    fn from(rec: &Recommendation) -> Self {
        Self {
            kind: rec.kind.to_string(),
            title: rec.title.clone(),
            impact: rec.impact.to_string(),
            confidence: format!("{:.2}", rec.confidence),
            description: rec.description.clone(),
        }
    }
}

#[derive(Tabled)]
pub struct DayRow {
    #[tabled(rename = "Date")]
    pub date: NaiveDate,
    #[tabled(rename = "Zones")]
    pub zones: usize,
    #[tabled(rename = "Predictions")]
    pub predictions: usize,
    #[tabled(rename = "Heatmap")]
    pub heatmap_points: usize,
    #[tabled(rename = "Recommendations")]
    pub recommendations: usize,
}

impl From<&DaySummary> for DayRow {
    fn from(day: &DaySummary) -> Self {
        Self {
            date: day.date,
            zones: day.zones,
            predictions: day.predictions,
            heatmap_points: day.heatmap_points,
            recommendations: day.recommendations,
        }
    }
}

#[derive(Tabled)]
pub struct RunRow {
    #[tabled(rename = "Run")]
    pub run_id: String,
    #[tabled(rename = "Trigger")]
    pub trigger: String,
    #[tabled(rename = "Status")]
    pub status: String,
    #[tabled(rename = "Dates")]
    pub dates: String,
    #[tabled(rename = "Days")]
    pub days: usize,
    #[tabled(rename = "Started")]
    pub started_at: String,
}

impl From<&RunRecord> for RunRow {
    fn from(run: &RunRecord) -> Self {
        Self {
            run_id: run.run_id.to_string(),
            trigger: run.trigger.as_str().to_string(),
            status: run.status.as_str().to_string(),
            dates: format!("{} .. {}", run.start_date, run.end_date),
            days: run.days.len(),
            started_at: run.started_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        }
    }
}

/// Output for `db status`
#[derive(Debug, Serialize)]
pub struct MigrationOutput {
    pub version: i64,
    pub description: String,
    pub applied: bool,
}

impl From<&MigrationStatus> for MigrationOutput {
    fn from(status: &MigrationStatus) -> Self {
        Self {
            version: status.version,
            description: status.description.clone(),
            applied: status.applied,
        }
    }
}

#[derive(Tabled)]
pub struct MigrationRow {
    #[tabled(rename = "Version")]
    pub version: i64,
    #[tabled(rename = "Description")]
    pub description: String,
    #[tabled(rename = "Applied")]
    pub applied: String,
}

impl From<&MigrationOutput> for MigrationRow {
    fn from(status: &MigrationOutput) -> Self {
        Self {
            version: status.version,
            description: status.description.clone(),
            applied: if status.applied { "yes" } else { "pending" }.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use geodemand_core::models::{Coordinate, ZoneId};

    fn zone() -> Zone {
        let now = Utc::now();
        Zone {
            id: ZoneId::new(),
            cell_key: "37.5000:127.0350".to_string(),
            name: "Gangnam Station".to_string(),
            footprint: vec![Coordinate::new(37.5, 127.035)],
            expected_calls: 12,
            avg_fee: 4000.4,
            confidence: 0.95,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn prediction(zone_id: ZoneId, hour: u8, calls: u32) -> HourlyPrediction {
        HourlyPrediction {
            zone_id,
            hour,
            expected_calls: calls,
            confidence: 0.3,
            prediction_date: NaiveDate::from_ymd_opt(2024, 5, 30).unwrap(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_zone_row_peak_hour_prefers_earliest_tie() {
        let zone = zone();
        let predictions =
            vec![prediction(zone.id, 18, 4), prediction(zone.id, 12, 4), prediction(zone.id, 9, 1)];
        let row = ZoneRow::new(&zone, &predictions);

        assert_eq!(row.peak_hour, "12:00 (4)");
        assert_eq!(row.avg_fee, "4000");
        assert_eq!(row.confidence, "0.95");
    }

    #[test]
    fn test_zone_row_without_predictions() {
        let row = ZoneRow::new(&zone(), &[]);
        assert_eq!(row.peak_hour, "-");
    }

    #[test]
    fn test_zone_output_flattens_zone() {
        let output = ZoneOutput { zone: zone(), predictions: Vec::new() };
        let value = serde_json::to_value(&output).unwrap();
        assert_eq!(value["name"], "Gangnam Station");
        assert!(value["predictions"].as_array().unwrap().is_empty());
    }
}
