use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};
use tracing::debug;

use crate::config::GatewayConfig;
use crate::error::{Error, Result};

/// Boundary to the external text-generation service. Every transport,
/// authentication, or malformed-response condition comes back as an
/// `Error::Generation` value; nothing raises past this trait, so the
/// orchestrator can uniformly decide whether to fall back.
#[async_trait]
pub trait GenerationGateway: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// HTTP gateway to the Gemini `generateContent` endpoint.
pub struct GeminiGateway {
    client: reqwest::Client,
    config: GatewayConfig,
}

impl GeminiGateway {
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn request_body(&self, prompt: &str) -> JsonValue {
        json!({
            "contents": [
                {
                    "parts": [
                        {"text": prompt}
                    ]
                }
            ],
            "generationConfig": {
                "temperature": self.config.temperature,
                "topK": self.config.top_k,
                "topP": self.config.top_p,
                "maxOutputTokens": self.config.max_output_tokens,
            }
        })
    }
}

#[async_trait]
impl GenerationGateway for GeminiGateway {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| Error::Generation("no api_key configured".into()))?;

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.config.endpoint, self.config.model, api_key
        );

        debug!(model = %self.config.model, "Sending generation request");

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| Error::Generation(format!("Request failed: {}", e)))?;

        let body: JsonValue = response
            .json()
            .await
            .map_err(|e| Error::Generation(format!("Failed to parse response: {}", e)))?;

        extract_candidate_text(&body)
    }
}

/// Pulls `candidates[0].content.parts[0].text` out of a generation response.
/// An `error.message` field, or the absence of that path, is a failure value.
fn extract_candidate_text(body: &JsonValue) -> Result<String> {
    if let Some(message) = body.pointer("/error/message").and_then(JsonValue::as_str) {
        return Err(Error::Generation(message.to_string()));
    }

    match body
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(JsonValue::as_str)
    {
        Some(text) => Ok(text.to_string()),
        None if body.get("candidates").is_some() => Err(Error::Generation(
            "Invalid candidate structure in response".into(),
        )),
        None => Err(Error::Generation("No candidates in response".into())),
    }
}
