//! OpenAI chat-completions backend.

use serde::{Deserialize, Serialize};

use crate::config::{Beacon, ProjectRule};

use super::{build_prompt, parse_enrichment_response, Enrichment, Provider, ProviderError};

const API_URL: &str = "https://api.openai.com/v1/chat/completions";

pub struct OpenAi {
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct Request<'a> {
    model: &'a str,
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
    choices: Vec<Choice>,
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
}

impl OpenAi {
    pub fn new(api_key: String, model: String) -> Self {
        OpenAi { api_key, model }
    }
}

impl Provider for OpenAi {
    fn enrich(
        &self,
        description: &str,
        beacons: &[Beacon],
        projects: &[ProjectRule],
    ) -> Result<Enrichment, ProviderError> {
        let prompt = build_prompt(description, beacons, projects);
        let body = serde_json::to_string(&Request {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: "You are a task enrichment assistant. Respond only with valid JSON.",
                },
                Message {
                    role: "user",
                    content: &prompt,
                },
            ],
        })?;

        tracing::debug!(model = %self.model, "sending openai enrichment request");
        let agent = ureq::AgentBuilder::new()
            .timeout(std::time::Duration::from_secs(super::REQUEST_TIMEOUT_SECS))
            .build();
        let raw = agent
            .post(API_URL)
            .set("Content-Type", "application/json")
            .set("Authorization", &format!("Bearer {}", self.api_key))
            .send_string(&body)
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
        let first = resp.choices.first().ok_or(ProviderError::EmptyResponse)?;
        parse_enrichment_response(&first.message.content)
    }
}
