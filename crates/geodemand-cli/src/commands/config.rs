//! Config command implementation

use anyhow::Result;
use geodemand_core::config::ConfigSource;
use serde::Serialize;
use tabled::Tabled;

use super::GlobalOptions;
use crate::config_loader::load_config;
use crate::output::OutputWriter;

#[derive(Debug, Serialize, Tabled)]
struct ConfigEntry {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Source")]
    source: String,
}

pub fn execute(globals: &GlobalOptions, output: &OutputWriter) -> Result<()> {
    let config = load_config(globals.config.as_deref())?;

    let mut entries: Vec<ConfigEntry> = config
        .to_inspection_map()
        .into_iter()
        .map(|(key, (value, source))| ConfigEntry { key, value, source: source_label(source) })
        .collect();
    entries.sort_by(|a, b| a.key.cmp(&b.key));

    if let Err(e) = config.pipeline_settings() {
        output.warning(format!("Configuration is not usable: {}", e));
    }

    if output.is_json() {
        return output.result(&entries);
    }

    output.section("Configuration");
    output.table(entries);
    Ok(())
}

fn source_label(source: ConfigSource) -> String {
    match source {
        ConfigSource::Default => "default",
        ConfigSource::File => "file",
        ConfigSource::Environment => "env",
        ConfigSource::Cli => "cli",
    }
    .to_string()
}
