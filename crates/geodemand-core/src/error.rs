//! Error types for geodemand

use chrono::NaiveDate;
use std::fmt::Display;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeodemandError {
    // Validation errors
    #[error("Invalid date range {start}..{end}: {reason}")]
    InvalidDateRange {
        start: NaiveDate,
        end: NaiveDate,
        reason: String,
    },

    #[error("Date range of {days} days exceeds the maximum of {max} days")]
    RangeTooLong { days: i64, max: i64 },

    #[error("Invalid date '{value}': expected YYYY-MM-DD")]
    InvalidDate { value: String },

    // Zone errors
    #[error("Zone not found: {key}")]
    ZoneNotFound { key: String },

    // Storage errors
    #[error("Storage operation '{operation}' failed: {reason}")]
    Storage { operation: String, reason: String },

    // Narrator errors
    #[error("Narrator unavailable: {reason}")]
    NarratorUnavailable { reason: String },

    // Configuration errors
    #[error("Missing required configuration: {key}")]
    ConfigMissing { key: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl GeodemandError {
    /// Build a storage error for the named operation
    pub fn storage(operation: impl Into<String>, reason: impl Display) -> Self {
        Self::Storage { operation: operation.into(), reason: reason.to_string() }
    }

    /// Whether the error was raised while validating caller input,
    /// before any computation or side effect took place
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidDateRange { .. }
                | Self::RangeTooLong { .. }
                | Self::InvalidDate { .. }
                | Self::ConfigInvalid { .. }
                | Self::ConfigMissing { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, GeodemandError>;
