//! geodemand Core - Domain models, errors, and configuration
//!
//! This crate contains the domain types shared by the demand-prediction
//! pipeline and the adapters around it.

pub mod config;
pub mod error;
pub mod models;

pub use error::{GeodemandError, Result};
