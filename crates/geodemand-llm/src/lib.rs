//! geodemand LLM - Narrative enrichment
//!
//! This crate defines the port used to give zones human-readable names and
//! recommendations a sentence of context, along with an Ollama adapter and
//! deterministic fallbacks for when no model is reachable.

pub mod factory;
pub mod fallback;
pub mod ollama;
pub mod ports;
pub mod timeout;

// Re-export main types
pub use factory::narrator_from_spec;
pub use fallback::{describe_or_template, fallback_zone_name, name_or_fallback, OfflineNarrator};
pub use ollama::OllamaNarrator;
pub use ports::{AreaStats, Narrator};
pub use timeout::TimeoutNarrator;
