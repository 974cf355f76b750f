//! geodemand Store - Storage ports and adapters
//!
//! This crate defines the storage ports used by the pipeline and provides
//! in-memory and PostgreSQL adapter implementations.

pub mod memory;
pub mod ports;
pub mod postgres;

pub use memory::{MemoryEventStore, MemoryForecastStore, MemoryRunLog, MemoryZoneStore};
pub use ports::{EventStore, ForecastStore, RunLogStore, ZoneStore};
