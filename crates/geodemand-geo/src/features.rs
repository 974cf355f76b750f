//! GeoJSON views of zones and heatmap points

use geodemand_core::models::{Coordinate, HeatmapPoint, ZoneWithPredictions};
use geojson::{Feature, FeatureCollection, Geometry, Value};
use serde_json::{json, Map, Value as JsonValue};

fn position(coordinate: &Coordinate) -> Vec<f64> {
    vec![coordinate.lng, coordinate.lat]
}

fn feature(geometry: Value, properties: Map<String, JsonValue>) -> Feature {
    Feature {
        geometry: Some(Geometry::new(geometry)),
        properties: Some(properties),
        id: None,
        bbox: None,
        foreign_members: None,
    }
}

/// Polygon feature for a zone, with its hourly predictions as a property
pub fn zone_feature(entry: &ZoneWithPredictions) -> Feature {
    let zone = &entry.zone;
    let ring = zone.footprint.iter().map(position).collect();

    let hourly: Vec<JsonValue> = entry
        .predictions
        .iter()
        .map(|p| {
            json!({
                "hour": p.hour,
                "expected_calls": p.expected_calls,
                "confidence": p.confidence,
            })
        })
        .collect();

    let mut properties = Map::new();
    properties.insert("id".to_string(), JsonValue::from(zone.id.to_string()));
    properties.insert("cell_key".to_string(), JsonValue::from(zone.cell_key.clone()));
    properties.insert("name".to_string(), JsonValue::from(zone.name.clone()));
    properties.insert("expected_calls".to_string(), JsonValue::from(zone.expected_calls));
    properties.insert("avg_fee".to_string(), JsonValue::from(zone.avg_fee));
    properties.insert("confidence".to_string(), JsonValue::from(zone.confidence));
    properties.insert("is_active".to_string(), JsonValue::from(zone.is_active));
    properties.insert("hourly".to_string(), JsonValue::from(hourly));

    feature(Value::Polygon(vec![ring]), properties)
}

/// Point feature for a heatmap sample
pub fn heatmap_feature(point: &HeatmapPoint) -> Feature {
    let mut properties = Map::new();
    properties.insert("weight".to_string(), JsonValue::from(point.weight));
    properties.insert("recent_orders".to_string(), JsonValue::from(point.recent_orders));
    properties.insert("avg_wait_minutes".to_string(), JsonValue::from(point.avg_wait_minutes));
    properties.insert("trend".to_string(), JsonValue::from(point.trend.as_str()));

    feature(Value::Point(position(&point.location)), properties)
}

pub fn zone_collection(entries: &[ZoneWithPredictions]) -> FeatureCollection {
    FeatureCollection {
        features: entries.iter().map(zone_feature).collect(),
        bbox: None,
        foreign_members: None,
    }
}

pub fn heatmap_collection(points: &[HeatmapPoint]) -> FeatureCollection {
    FeatureCollection {
        features: points.iter().map(heatmap_feature).collect(),
        bbox: None,
        foreign_members: None,
    }
}
