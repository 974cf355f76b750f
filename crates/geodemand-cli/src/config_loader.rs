//! Configuration loading utilities for CLI commands

use anyhow::{Context, Result};
use geodemand_core::config::{CliConfigOverrides, LayeredConfig, PipelineSettings};
use geodemand_llm::{narrator_from_spec, Narrator};
use std::path::Path;
use std::sync::Arc;

use crate::cli::TuningArgs;

/// Load layered configuration, from `path` when given
pub fn load_config(path: Option<&Path>) -> Result<LayeredConfig> {
    match path {
        Some(path) => Ok(LayeredConfig::with_defaults()
            .load_from_file(path)
            .with_context(|| format!("Failed to load configuration file {}", path.display()))?
            .load_from_env()),
        None => LayeredConfig::discover().context("Failed to load configuration"),
    }
}

/// Load layered configuration with CLI overrides applied last
pub fn load_config_with_overrides(
    path: Option<&Path>,
    tuning: &TuningArgs,
) -> Result<LayeredConfig> {
    let mut config = load_config(path)?;
    config.update_from_cli(overrides_from(tuning));
    Ok(config)
}

/// Resolve settings and the narrator from a loaded configuration
pub fn pipeline_parts(config: &LayeredConfig) -> Result<(PipelineSettings, Arc<dyn Narrator>)> {
    let settings = config.pipeline_settings().context("Invalid pipeline configuration")?;
    let narrator = narrator_from_spec(&config.narrator.value, settings.narrator_timeout)
        .context("Invalid narrator configuration")?;
    Ok((settings, narrator))
}

fn overrides_from(tuning: &TuningArgs) -> CliConfigOverrides {
    CliConfigOverrides {
        zone_window_days: tuning.zone_window_days,
        heatmap_window_days: tuning.heatmap_window_days,
        min_zone_orders: tuning.min_orders,
        max_zones: tuning.max_zones,
        narrator: tuning.narrator.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geodemand_core::config::ConfigSource;
    use std::io::Write;

    #[test]
    fn test_overrides_take_precedence_over_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_zones = 5\nnarrator = \"offline\"").unwrap();

        let tuning = TuningArgs { max_zones: Some(3), ..Default::default() };
        let config = load_config_with_overrides(Some(file.path()), &tuning).unwrap();

        assert_eq!(config.max_zones.value, 3);
        assert_eq!(config.max_zones.source, ConfigSource::Cli);
        assert_eq!(config.narrator.value, "offline");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = load_config(Some(Path::new("/nonexistent/geodemand.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_offline_narrator_resolves() {
        let mut config = LayeredConfig::with_defaults();
        config.update_from_cli(CliConfigOverrides {
            narrator: Some("offline".to_string()),
            ..Default::default()
        });
        let (settings, narrator) = pipeline_parts(&config).unwrap();
        assert_eq!(settings.max_zones, 20);
        assert_eq!(narrator.model_name(), "offline");
    }
}
