use geodemand_core::error::{GeodemandError, Result};
use std::sync::Arc;
use std::time::Duration;

use crate::fallback::OfflineNarrator;
use crate::ollama::OllamaNarrator;
use crate::ports::Narrator;
use crate::timeout::TimeoutNarrator;

/// Build a narrator from a `provider:model` string.
///
/// Supported values are `ollama:<model>` and `offline`. The result is
/// wrapped so that no call outlives `limit`.
pub fn narrator_from_spec(spec: &str, limit: Duration) -> Result<Arc<dyn Narrator>> {
    let spec = spec.trim();
    let inner: Arc<dyn Narrator> = match spec.split_once(':') {
        Some(("ollama", model)) if !model.trim().is_empty() => {
            Arc::new(OllamaNarrator::from_env(model.trim()))
        }
        None if spec.eq_ignore_ascii_case("offline") || spec.eq_ignore_ascii_case("none") => {
            return Ok(Arc::new(OfflineNarrator));
        }
        _ => {
            return Err(GeodemandError::ConfigInvalid {
                key: "narrator".to_string(),
                reason: format!("Unsupported narrator '{}'. Use ollama:<model> or offline", spec),
            })
        }
    };

    Ok(Arc::new(TimeoutNarrator::new(inner, limit)))
}
