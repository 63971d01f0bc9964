//! Ollama backend for local models.

use serde::{Deserialize, Serialize};

use crate::config::{Beacon, ProjectRule};

use super::{build_prompt, parse_enrichment_response, Enrichment, Provider, ProviderError};

pub struct Ollama {
    base_url: String,
    model: String,
}

#[derive(Serialize)]
struct Request<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    format: &'static str,
}

#[derive(Deserialize)]
struct Response {
    #[serde(default)]
    response: String,
    #[serde(default)]
    error: String,
}

impl Ollama {
    pub fn new(base_url: String, model: String) -> Self {
        Ollama { base_url, model }
    }
}

impl Provider for Ollama {
    fn enrich(
        &self,
        description: &str,
        beacons: &[Beacon],
        projects: &[ProjectRule],
    ) -> Result<Enrichment, ProviderError> {
        let prompt = build_prompt(description, beacons, projects);
        let body = serde_json::to_string(&Request {
            model: &self.model,
            prompt: &prompt,
            stream: false,
            format: "json",
        })?;

        let url = format!("{}/api/generate", self.base_url);
        tracing::debug!(model = %self.model, %url, "sending ollama enrichment request");
        let agent = ureq::AgentBuilder::new()
            .timeout(std::time::Duration::from_secs(super::REQUEST_TIMEOUT_SECS))
            .build();
        let raw = agent
            .post(&url)
            .set("Content-Type", "application/json")
            .send_string(&body)
            .map_err(|e| ProviderError::Request(e.to_string()))?
            .into_string()
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        let resp: Response = serde_json::from_str(&raw)?;
        if !resp.error.is_empty() {
            return Err(ProviderError::Api(resp.error));
        }
        parse_enrichment_response(&resp.response)
    }
}
