use async_trait::async_trait;
use geodemand_core::error::{GeodemandError, Result};
use geodemand_core::models::Coordinate;
use serde::{Deserialize, Serialize};

use crate::ports::{AreaStats, Narrator};

/// Default Ollama endpoint
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Names longer than this are treated as a failed generation
const MAX_NAME_CHARS: usize = 60;

/// Ollama narrator implementation using the generate API
pub struct OllamaNarrator {
    /// Base URL for Ollama API (e.g., "http://localhost:11434")
    base_url: String,

    /// Model name to use for generation
    model: String,

    /// HTTP client
    client: reqwest::Client,
}

impl OllamaNarrator {
    /// Create a new Ollama narrator
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Create with default localhost URL
    pub fn localhost(model: impl Into<String>) -> Self {
        Self::new(DEFAULT_OLLAMA_URL, model)
    }

    /// Create using `OLLAMA_HOST` when set, localhost otherwise
    pub fn from_env(model: impl Into<String>) -> Self {
        let base_url = std::env::var("OLLAMA_HOST")
            .ok()
            .filter(|h| !h.trim().is_empty())
            .map(|h| if h.starts_with("http") { h } else { format!("http://{}", h) })
            .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string());
        Self::new(base_url, model)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn generate(&self, prompt: String) -> Result<String> {
        let request = OllamaGenerateRequest { model: self.model.clone(), prompt, stream: false };

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| GeodemandError::NarratorUnavailable {
                reason: format!("Failed to connect to Ollama at {}: {}", self.base_url, e),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(GeodemandError::NarratorUnavailable {
                reason: format!("Ollama API error ({}) for model '{}': {}", status, self.model, error_text),
            });
        }

        let generated: OllamaGenerateResponse =
            response.json().await.map_err(|e| GeodemandError::NarratorUnavailable {
                reason: format!("Failed to parse Ollama response: {}", e),
            })?;

        Ok(generated.response)
    }
}

#[async_trait]
impl Narrator for OllamaNarrator {
    async fn name_for_coordinate(&self, location: &Coordinate) -> Result<String> {
        let prompt = format!(
            "Give the common neighborhood or landmark name for latitude {:.4}, longitude {:.4}. \
             Reply with the name only, at most five words.",
            location.lat, location.lng
        );
        let raw = self.generate(prompt).await?;
        clean_name(&raw).ok_or_else(|| GeodemandError::NarratorUnavailable {
            reason: format!("Model '{}' returned an unusable name: {:?}", self.model, raw),
        })
    }

    async fn describe_area(&self, location: &Coordinate, stats: &AreaStats) -> Result<String> {
        let prompt = format!(
            "Write one short sentence for a delivery rider about the area '{}' \
             (latitude {:.4}, longitude {:.4}). Around {:02}:00 it usually sees {} orders \
             with an average fee of {:.0}. No preamble.",
            stats.zone_name, location.lat, location.lng, stats.hour, stats.expected_calls, stats.avg_fee
        );
        let raw = self.generate(prompt).await?;
        clean_sentence(&raw).ok_or_else(|| GeodemandError::NarratorUnavailable {
            reason: format!("Model '{}' returned an empty description", self.model),
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// First line of a generated name, without surrounding quotes or punctuation
fn clean_name(raw: &str) -> Option<String> {
    let line = raw.lines().map(str::trim).find(|l| !l.is_empty())?;
    let name = line
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '.' || c == '*')
        .trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_CHARS {
        return None;
    }
    Some(name.to_string())
}

/// Generated text collapsed onto a single line
fn clean_sentence(raw: &str) -> Option<String> {
    let sentence = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let sentence = sentence.trim_matches('"').trim().to_string();
    (!sentence.is_empty()).then_some(sentence)
}

/// Request body for Ollama generate API
#[derive(Debug, Serialize)]
struct OllamaGenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
}

/// Response from Ollama generate API
#[derive(Debug, Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}
