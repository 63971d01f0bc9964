//! Anthropic Messages API backend.

use serde::{Deserialize, Serialize};

use crate::config::{Beacon, ProjectRule};

use super::{build_prompt, parse_enrichment_response, Enrichment, Provider, ProviderError};

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 1024;

pub struct Anthropic {
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct Request<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct Response {
    #[serde(default)]
    content: Vec<ContentBlock>,
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
}

impl Anthropic {
    pub fn new(api_key: String, model: String) -> Self {
        Anthropic { api_key, model }
    }
}

impl Provider for Anthropic {
    fn enrich(
        &self,
        description: &str,
        beacons: &[Beacon],
        projects: &[ProjectRule],
    ) -> Result<Enrichment, ProviderError> {
        let prompt = build_prompt(description, beacons, projects);
        let body = serde_json::to_string(&Request {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            messages: vec![Message {
                role: "user",
                content: &prompt,
            }],
        })?;

        tracing::debug!(model = %self.model, "sending anthropic enrichment request");
        let agent = ureq::AgentBuilder::new()
            .timeout(std::time::Duration::from_secs(super::REQUEST_TIMEOUT_SECS))
            .build();
        let raw = agent
            .post(API_URL)
            .set("Content-Type", "application/json")
            .set("x-api-key", &self.api_key)
            .set("anthropic-version", API_VERSION)
            .send_string(&body)
            // 4xx responses still carry a JSON error body worth surfacing.
            .or_else(|e| match e {
                ureq::Error::Status(_, resp) => Ok(resp),
                other => Err(ProviderError::Request(other.to_string())),
            })?
            .into_string()
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        let resp: Response = serde_json::from_str(&raw)?;
        if let Some(err) = resp.error {
            return Err(ProviderError::Api(err.message));
        }
        let first = resp.content.first().ok_or(ProviderError::EmptyResponse)?;
        parse_enrichment_response(&first.text)
    }
}
