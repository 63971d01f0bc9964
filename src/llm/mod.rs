//! Suggestion-service backends.
//!
//! The service is treated as an opaque, possibly-failing oracle: it receives
//! a task description plus the full beacon catalog and project list on every
//! call and is expected to return one JSON object describing the suggested
//! metadata. Three backends are supported — anthropic, openai and ollama —
//! selected via `[llm]` in the config file.

pub mod anthropic;
pub mod ollama;
pub mod openai;
mod prompt;

use serde::Deserialize;
use thiserror::Error;

use crate::config::{Beacon, Config, ProjectRule};

pub use anthropic::Anthropic;
pub use ollama::Ollama;
pub use openai::OpenAi;

/// Request timeout for suggestion calls.
pub(crate) const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("unknown provider \"{0}\" (expected anthropic, openai or ollama)")]
    UnknownProvider(String),
    #[error("API key not set (configured env var: {env})")]
    MissingApiKey { env: String },
    #[error("request failed: {0}")]
    Request(String),
    #[error("API error: {0}")]
    Api(String),
    #[error("empty response from API")]
    EmptyResponse,
    #[error("no JSON object found in response")]
    NoJson,
    #[error("malformed JSON: {0}")]
    BadJson(#[from] serde_json::Error),
}

/// The service's suggested metadata for one task.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Enrichment {
    #[serde(default)]
    pub description: String,
    /// Beacon tags, e.g. `["b.great.dev"]`.
    #[serde(default)]
    pub beacons: Vec<String>,
    /// Direction tags, e.g. `["d.sw.design"]`.
    #[serde(default)]
    pub directions: Vec<String>,
    #[serde(default)]
    pub project: String,
    /// H, M, L or empty.
    #[serde(default)]
    pub priority: String,
    /// Taskwarrior date expression or empty.
    #[serde(default)]
    pub due: String,
    #[serde(default)]
    pub scheduled: String,
    /// E, N or D.
    #[serde(default)]
    pub effort: String,
    /// H, M or L.
    #[serde(default)]
    pub impact: String,
    /// 15m, 30m, 1h, 2h, 4h, 8h or 2d.
    #[serde(default)]
    pub estimate: String,
    /// H, M or L.
    #[serde(default)]
    pub fun: String,
    #[serde(default)]
    pub blocks: u32,
    /// True when the task aligns with no beacon at all.
    #[serde(default)]
    pub is_waste: bool,
    /// Free-text rationale for the assessment.
    #[serde(default)]
    pub reasoning: String,
}

/// A suggestion-service backend.
///
/// `Send + Sync` so a shared handle can be moved onto the worker thread that
/// issues the (single) in-flight request.
pub trait Provider: Send + Sync {
    fn enrich(
        &self,
        description: &str,
        beacons: &[Beacon],
        projects: &[ProjectRule],
    ) -> Result<Enrichment, ProviderError>;
}

/// Construct the backend named in the config.
pub fn new_provider(cfg: &Config) -> Result<Box<dyn Provider>, ProviderError> {
    match cfg.llm.provider.as_str() {
        "anthropic" => {
            let key = cfg.api_key().ok_or_else(|| ProviderError::MissingApiKey {
                env: cfg.llm.api_key_env.clone(),
            })?;
            Ok(Box::new(Anthropic::new(key, cfg.llm.model.clone())))
        }
        "openai" => {
            let key = cfg.api_key().ok_or_else(|| ProviderError::MissingApiKey {
                env: cfg.llm.api_key_env.clone(),
            })?;
            Ok(Box::new(OpenAi::new(key, cfg.llm.model.clone())))
        }
        "ollama" => {
            let base_url = if cfg.llm.base_url.is_empty() {
                "http://localhost:11434".to_string()
            } else {
                cfg.llm.base_url.clone()
            };
            Ok(Box::new(Ollama::new(base_url, cfg.llm.model.clone())))
        }
        other => Err(ProviderError::UnknownProvider(other.to_string())),
    }
}

pub(crate) use prompt::{build_prompt, parse_enrichment_response};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_provider_is_rejected() {
        let cfg = Config {
            llm: crate::config::LlmConfig {
                provider: "palm".into(),
                ..Default::default()
            },
            ..Config::default()
        };
        assert!(matches!(
            new_provider(&cfg),
            Err(ProviderError::UnknownProvider(_))
        ));
    }

    #[test]
    fn enrichment_tolerates_missing_fields() {
        let e: Enrichment =
            serde_json::from_str(r#"{"beacons": ["b.healthy"], "is_waste": false}"#).unwrap();
        assert_eq!(e.beacons, vec!["b.healthy"]);
        assert!(e.description.is_empty());
        assert_eq!(e.blocks, 0);
    }
}
