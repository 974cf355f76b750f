use crate::error::{GeodemandError, Result};
use crate::models::BoundingBox;
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Default configuration file name looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "geodemand.toml";

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Weights of the zone confidence heuristic.
///
/// `confidence = clamp(count * per_order + avg_rating * per_rating_point + bonus, min, max)`
/// where `bonus` is `fast_bonus` when the average duration is below
/// `fast_threshold_minutes` and `slow_bonus` otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceWeights {
    pub per_order: f64,
    pub per_rating_point: f64,
    pub fast_threshold_minutes: f64,
    pub fast_bonus: f64,
    pub slow_bonus: f64,
    pub min: f64,
    pub max: f64,
}

impl Default for ConfidenceWeights {
    fn default() -> Self {
        Self {
            per_order: 0.01,
            per_rating_point: 0.15,
            fast_threshold_minutes: 20.0,
            fast_bonus: 0.10,
            slow_bonus: 0.05,
            min: 0.30,
            max: 0.95,
        }
    }
}

/// Layered configuration for geodemand
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub zone_window_days: ConfigValue<u32>,
    pub heatmap_window_days: ConfigValue<u32>,
    pub min_zone_orders: ConfigValue<u32>,
    pub max_zones: ConfigValue<usize>,
    pub utc_offset_hours: ConfigValue<i32>,
    pub service_area: ConfigValue<BoundingBox>,
    pub narrator: ConfigValue<String>,
    pub narrator_timeout_secs: ConfigValue<u64>,
    pub max_range_days: ConfigValue<u32>,
    pub deactivate_missing_zones: ConfigValue<bool>,
    pub confidence: ConfigValue<ConfidenceWeights>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        Self {
            zone_window_days: ConfigValue::new(30, ConfigSource::Default),
            heatmap_window_days: ConfigValue::new(7, ConfigSource::Default),
            min_zone_orders: ConfigValue::new(10, ConfigSource::Default),
            max_zones: ConfigValue::new(20, ConfigSource::Default),
            utc_offset_hours: ConfigValue::new(9, ConfigSource::Default),
            service_area: ConfigValue::new(BoundingBox::seoul_metro(), ConfigSource::Default),
            narrator: ConfigValue::new("ollama:llama3.2".to_string(), ConfigSource::Default),
            narrator_timeout_secs: ConfigValue::new(10, ConfigSource::Default),
            max_range_days: ConfigValue::new(92, ConfigSource::Default),
            deactivate_missing_zones: ConfigValue::new(false, ConfigSource::Default),
            confidence: ConfigValue::new(ConfidenceWeights::default(), ConfigSource::Default),
        }
    }

    /// Defaults, then `geodemand.toml` in the working directory if present, then environment
    pub fn discover() -> Result<Self> {
        let config = Self::with_defaults();
        let config = if Path::new(DEFAULT_CONFIG_FILE).exists() {
            config.load_from_file(DEFAULT_CONFIG_FILE)?
        } else {
            config
        };
        Ok(config.load_from_env())
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| GeodemandError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| GeodemandError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(days) = file_config.zone_window_days {
            self.zone_window_days.update(days, ConfigSource::File);
        }
        if let Some(days) = file_config.heatmap_window_days {
            self.heatmap_window_days.update(days, ConfigSource::File);
        }
        if let Some(orders) = file_config.min_zone_orders {
            self.min_zone_orders.update(orders, ConfigSource::File);
        }
        if let Some(max) = file_config.max_zones {
            self.max_zones.update(max, ConfigSource::File);
        }
        if let Some(hours) = file_config.utc_offset_hours {
            self.utc_offset_hours.update(hours, ConfigSource::File);
        }
        if let Some([min_lat, min_lng, max_lat, max_lng]) = file_config.service_area {
            self.service_area
                .update(BoundingBox::new(min_lat, min_lng, max_lat, max_lng), ConfigSource::File);
        }
        if let Some(narrator) = file_config.narrator {
            self.narrator.update(narrator, ConfigSource::File);
        }
        if let Some(secs) = file_config.narrator_timeout_secs {
            self.narrator_timeout_secs.update(secs, ConfigSource::File);
        }
        if let Some(days) = file_config.max_range_days {
            self.max_range_days.update(days, ConfigSource::File);
        }
        if let Some(deactivate) = file_config.deactivate_missing_zones {
            self.deactivate_missing_zones.update(deactivate, ConfigSource::File);
        }
        if let Some(weights) = file_config.confidence {
            self.confidence.update(weights, ConfigSource::File);
        }

        Ok(self)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        if let Some(days) = env_parsed::<u32>("GEODEMAND_ZONE_WINDOW_DAYS", "positive integer") {
            self.zone_window_days.update(days, ConfigSource::Environment);
        }

        if let Some(days) = env_parsed::<u32>("GEODEMAND_HEATMAP_WINDOW_DAYS", "positive integer")
        {
            self.heatmap_window_days.update(days, ConfigSource::Environment);
        }

        if let Some(orders) = env_parsed::<u32>("GEODEMAND_MIN_ZONE_ORDERS", "positive integer") {
            self.min_zone_orders.update(orders, ConfigSource::Environment);
        }

        if let Some(max) = env_parsed::<usize>("GEODEMAND_MAX_ZONES", "positive integer") {
            self.max_zones.update(max, ConfigSource::Environment);
        }

        if let Some(hours) = env_parsed::<i32>("GEODEMAND_UTC_OFFSET_HOURS", "integer hours") {
            self.utc_offset_hours.update(hours, ConfigSource::Environment);
        }

        // GEODEMAND_SERVICE_AREA
        if let Ok(area_str) = env::var("GEODEMAND_SERVICE_AREA") {
            match parse_bounding_box(&area_str) {
                Ok(area) => self.service_area.update(area, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid GEODEMAND_SERVICE_AREA value '{}': expected min_lat,min_lng,max_lat,max_lng",
                    area_str
                ),
            }
        }

        // GEODEMAND_NARRATOR
        if let Ok(narrator) = env::var("GEODEMAND_NARRATOR") {
            self.narrator.update(narrator, ConfigSource::Environment);
        }

        if let Some(secs) = env_parsed::<u64>("GEODEMAND_NARRATOR_TIMEOUT_SECS", "seconds") {
            self.narrator_timeout_secs.update(secs, ConfigSource::Environment);
        }

        if let Some(days) = env_parsed::<u32>("GEODEMAND_MAX_RANGE_DAYS", "positive integer") {
            self.max_range_days.update(days, ConfigSource::Environment);
        }

        // GEODEMAND_DEACTIVATE_MISSING_ZONES
        if let Ok(flag_str) = env::var("GEODEMAND_DEACTIVATE_MISSING_ZONES") {
            match parse_bool(&flag_str) {
                Ok(flag) => self.deactivate_missing_zones.update(flag, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid GEODEMAND_DEACTIVATE_MISSING_ZONES value '{}': expected true or false",
                    flag_str
                ),
            }
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        if let Some(days) = overrides.zone_window_days {
            self.zone_window_days.update(days, ConfigSource::Cli);
        }
        if let Some(days) = overrides.heatmap_window_days {
            self.heatmap_window_days.update(days, ConfigSource::Cli);
        }
        if let Some(orders) = overrides.min_zone_orders {
            self.min_zone_orders.update(orders, ConfigSource::Cli);
        }
        if let Some(max) = overrides.max_zones {
            self.max_zones.update(max, ConfigSource::Cli);
        }
        if let Some(narrator) = overrides.narrator {
            self.narrator.update(narrator, ConfigSource::Cli);
        }
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        map.insert(
            "zone_window_days".to_string(),
            (self.zone_window_days.value.to_string(), self.zone_window_days.source),
        );
        map.insert(
            "heatmap_window_days".to_string(),
            (self.heatmap_window_days.value.to_string(), self.heatmap_window_days.source),
        );
        map.insert(
            "min_zone_orders".to_string(),
            (self.min_zone_orders.value.to_string(), self.min_zone_orders.source),
        );
        map.insert(
            "max_zones".to_string(),
            (self.max_zones.value.to_string(), self.max_zones.source),
        );
        map.insert(
            "utc_offset_hours".to_string(),
            (format!("{:+}", self.utc_offset_hours.value), self.utc_offset_hours.source),
        );

        let area = &self.service_area.value;
        map.insert(
            "service_area".to_string(),
            (
                format!("{},{},{},{}", area.min_lat, area.min_lng, area.max_lat, area.max_lng),
                self.service_area.source,
            ),
        );

        map.insert("narrator".to_string(), (self.narrator.value.clone(), self.narrator.source));
        map.insert(
            "narrator_timeout_secs".to_string(),
            (self.narrator_timeout_secs.value.to_string(), self.narrator_timeout_secs.source),
        );
        map.insert(
            "max_range_days".to_string(),
            (self.max_range_days.value.to_string(), self.max_range_days.source),
        );
        map.insert(
            "deactivate_missing_zones".to_string(),
            (
                self.deactivate_missing_zones.value.to_string(),
                self.deactivate_missing_zones.source,
            ),
        );

        map
    }

    /// Validate the resolved values and produce the settings used by the pipeline
    pub fn pipeline_settings(&self) -> Result<PipelineSettings> {
        window_days("zone_window_days", self.zone_window_days.value)?;
        window_days("heatmap_window_days", self.heatmap_window_days.value)?;
        positive("min_zone_orders", u64::from(self.min_zone_orders.value))?;
        positive("max_zones", self.max_zones.value as u64)?;
        positive("max_range_days", u64::from(self.max_range_days.value))?;

        let hours = self.utc_offset_hours.value;
        let utc_offset = if (-12..=14).contains(&hours) {
            FixedOffset::east_opt(hours * 3600)
        } else {
            None
        }
        .ok_or_else(|| GeodemandError::ConfigInvalid {
            key: "utc_offset_hours".to_string(),
            reason: format!("{} is outside -12..=14", hours),
        })?;

        self.service_area.value.validate().map_err(|reason| GeodemandError::ConfigInvalid {
            key: "service_area".to_string(),
            reason,
        })?;

        let weights = self.confidence.value;
        if !(0.0..=1.0).contains(&weights.min) || weights.min > weights.max || weights.max > 1.0 {
            return Err(GeodemandError::ConfigInvalid {
                key: "confidence".to_string(),
                reason: format!("bounds [{}, {}] must satisfy 0 <= min <= max <= 1", weights.min, weights.max),
            });
        }

        Ok(PipelineSettings {
            zone_window_days: self.zone_window_days.value,
            heatmap_window_days: self.heatmap_window_days.value,
            min_zone_orders: self.min_zone_orders.value,
            max_zones: self.max_zones.value,
            utc_offset,
            service_area: self.service_area.value,
            narrator_timeout: Duration::from_secs(self.narrator_timeout_secs.value),
            max_range_days: self.max_range_days.value,
            deactivate_missing_zones: self.deactivate_missing_zones.value,
            confidence: weights,
        })
    }
}

/// Resolved, validated settings consumed by the pipeline
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Days of history used for zone discovery and hourly forecasts
    pub zone_window_days: u32,
    /// Days of history used for the heatmap
    pub heatmap_window_days: u32,
    pub min_zone_orders: u32,
    pub max_zones: usize,
    /// Offset used for hour-of-day bucketing and calendar days
    pub utc_offset: FixedOffset,
    pub service_area: BoundingBox,
    pub narrator_timeout: Duration,
    pub max_range_days: u32,
    pub deactivate_missing_zones: bool,
    pub confidence: ConfidenceWeights,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            zone_window_days: 30,
            heatmap_window_days: 7,
            min_zone_orders: 10,
            max_zones: 20,
            utc_offset: FixedOffset::east_opt(9 * 3600).expect("+09:00 is a valid offset"),
            service_area: BoundingBox::seoul_metro(),
            narrator_timeout: Duration::from_secs(10),
            max_range_days: 92,
            deactivate_missing_zones: false,
            confidence: ConfidenceWeights::default(),
        }
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    zone_window_days: Option<u32>,
    heatmap_window_days: Option<u32>,
    min_zone_orders: Option<u32>,
    max_zones: Option<usize>,
    utc_offset_hours: Option<i32>,
    service_area: Option<[f64; 4]>,
    narrator: Option<String>,
    narrator_timeout_secs: Option<u64>,
    max_range_days: Option<u32>,
    deactivate_missing_zones: Option<bool>,
    confidence: Option<ConfidenceWeights>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub zone_window_days: Option<u32>,
    pub heatmap_window_days: Option<u32>,
    pub min_zone_orders: Option<u32>,
    pub max_zones: Option<usize>,
    pub narrator: Option<String>,
}

fn env_parsed<T: std::str::FromStr>(var: &str, expected: &str) -> Option<T> {
    let raw = env::var(var).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Invalid {} value '{}': expected {}", var, raw, expected);
            None
        }
    }
}

/// Longest history window accepted for zones, forecasts and the heatmap
pub const MAX_WINDOW_DAYS: u32 = 3650;

fn window_days(key: &str, value: u32) -> Result<()> {
    positive(key, u64::from(value))?;
    if value > MAX_WINDOW_DAYS {
        return Err(GeodemandError::ConfigInvalid {
            key: key.to_string(),
            reason: format!("{} exceeds the maximum of {} days", value, MAX_WINDOW_DAYS),
        });
    }
    Ok(())
}

fn positive(key: &str, value: u64) -> Result<()> {
    if value == 0 {
        return Err(GeodemandError::ConfigInvalid {
            key: key.to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(())
}

/// Parse a bounding box from `min_lat,min_lng,max_lat,max_lng`
pub fn parse_bounding_box(s: &str) -> Result<BoundingBox> {
    let invalid = |reason: String| GeodemandError::ConfigInvalid {
        key: "service_area".to_string(),
        reason,
    };

    let parts = s
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| invalid(format!("Invalid number in '{}': {}", s, e)))?;

    match parts.as_slice() {
        [min_lat, min_lng, max_lat, max_lng] => {
            let bbox = BoundingBox::new(*min_lat, *min_lng, *max_lat, *max_lng);
            bbox.validate().map_err(invalid)?;
            Ok(bbox)
        }
        _ => Err(invalid(format!("Expected 4 comma-separated values, got {}", parts.len()))),
    }
}

/// Parse a boolean flag from string
pub fn parse_bool(s: &str) -> Result<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(GeodemandError::ConfigInvalid {
            key: "flag".to_string(),
            reason: format!("Invalid boolean: {}. Use true or false", s),
        }),
    }
}
