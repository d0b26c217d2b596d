//! Anthropic Messages API backend

use crate::{blocking_runtime, user_prompt};
use arbor_domain::{BackendError, Instructions, ModelBackend, ModelDescription, Query};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Messages API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.anthropic.com/v1/messages";

/// Model used when none is configured
pub const DEFAULT_MODEL: &str = "claude-3-haiku-20240307";

/// API version header value
pub const API_VERSION: &str = "2023-06-01";

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// Default number of attempts per request
pub const DEFAULT_MAX_RETRIES: u32 = 10;

/// Wait after a 429 before retrying
pub const RATE_LIMIT_BACKOFF_SECS: u64 = 60;

/// Chat backend on the Anthropic Messages API
pub struct AnthropicModel {
    endpoint: String,
    model: String,
    api_key: String,
    temperature: f64,
    max_tokens: u32,
    max_retries: u32,
    rate_limit_backoff: Duration,
    client: reqwest::Client,
    runtime: tokio::runtime::Runtime,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<Message>,
}

#[derive(Serialize)]
struct Message {
    role: &'static str,
    content: Vec<ContentBlock>,
}

#[derive(Serialize, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

impl MessagesResponse {
    fn first_text(self) -> Result<String, BackendError> {
        self.content
            .into_iter()
            .find(|block| block.kind == "text")
            .map(|block| block.text.trim().to_string())
            .ok_or_else(|| BackendError::InvalidResponse("No text block in response".to_string()))
    }
}

impl AnthropicModel {
    /// Create a backend for `model`
    ///
    /// The API key falls back to the `ANTHROPIC_API_KEY` environment variable.
    pub fn new(model: Option<String>, api_key: Option<String>) -> Result<Self, BackendError> {
        let api_key = api_key
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                BackendError::Other(format!(
                    "The Anthropic API requires a key. Pass one or set {}",
                    API_KEY_ENV
                ))
            })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| BackendError::Other(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_key,
            temperature: 0.0,
            max_tokens: 1_000,
            max_retries: DEFAULT_MAX_RETRIES,
            rate_limit_backoff: Duration::from_secs(RATE_LIMIT_BACKOFF_SECS),
            client,
            runtime: blocking_runtime()?,
        })
    }

    /// Send requests to another Messages API endpoint, such as a proxy
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the sampling temperature
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the completion token limit
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the maximum number of attempts per request
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    async fn send(
        &self,
        user_prompt: String,
        system: Option<&str>,
    ) -> Result<String, BackendError> {
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            system,
            messages: vec![Message {
                role: "user",
                content: vec![ContentBlock {
                    kind: "text".to_string(),
                    text: user_prompt,
                }],
            }],
        };

        let mut last_error = None;
        for attempt in 1..=self.max_retries {
            let response = self
                .client
                .post(&self.endpoint)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", API_VERSION)
                .json(&body)
                .send()
                .await;

            let delay = match response {
                Ok(response) if response.status().is_success() => {
                    let parsed = response.json::<MessagesResponse>().await.map_err(|e| {
                        BackendError::InvalidResponse(format!("Failed to parse response: {}", e))
                    })?;
                    return parsed.first_text();
                }
                Ok(response) if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS => {
                    warn!("Anthropic rate limit hit, sleeping {:?}", self.rate_limit_backoff);
                    last_error = Some(BackendError::RateLimited);
                    self.rate_limit_backoff
                }
                Ok(response) => {
                    let status = response.status();
                    let text = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unknown error".to_string());
                    warn!("Anthropic returned HTTP {}", status);
                    last_error = Some(BackendError::Communication(format!(
                        "HTTP {}: {}",
                        status, text
                    )));
                    Duration::from_secs(2u64.pow(attempt.min(6) - 1))
                }
                Err(e) => {
                    warn!("Anthropic API could not be reached: {}", e);
                    last_error =
                        Some(BackendError::Communication(format!("Request failed: {}", e)));
                    Duration::from_secs(2u64.pow(attempt.min(6) - 1))
                }
            };

            if attempt < self.max_retries {
                tokio::time::sleep(delay).await;
            }
        }

        Err(last_error
            .unwrap_or_else(|| BackendError::Communication("Max retries exceeded".to_string())))
    }
}

impl ModelBackend for AnthropicModel {
    fn describe(&self) -> ModelDescription {
        ModelDescription::text()
    }

    fn complete(
        &self,
        query: &Query<'_>,
        context: &str,
        instructions: &Instructions<'_>,
    ) -> Result<String, BackendError> {
        let prompt = user_prompt(query, context, instructions);
        debug!("Anthropic prompt length: {} chars", prompt.len());
        self.runtime.block_on(self.send(prompt, instructions.system_prompt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_with_explicit_key() {
        let model = AnthropicModel::new(None, Some("key".to_string())).unwrap();
        assert_eq!(model.model, DEFAULT_MODEL);
        assert_eq!(model.max_tokens, 1_000);
        assert_eq!(model.temperature, 0.0);
        assert_eq!(model.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(model.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_endpoint_override() {
        let model = AnthropicModel::new(None, Some("key".to_string()))
            .unwrap()
            .with_endpoint("http://localhost:8080/v1/messages");
        assert_eq!(model.endpoint, "http://localhost:8080/v1/messages");
    }

    #[test]
    fn test_empty_key_is_rejected() {
        // An explicit empty key wins over the environment and is filtered out
        let result = AnthropicModel::new(None, Some(String::new()));
        assert!(result.is_err());
    }

    #[test]
    fn test_response_first_text_block() {
        let json = r#"{"content":[{"type":"tool_use"},{"type":"text","text":"lease"}]}"#;
        let parsed: MessagesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.first_text().unwrap(), "lease");
    }

    #[test]
    fn test_response_without_text_is_invalid() {
        let parsed: MessagesResponse = serde_json::from_str(r#"{"content":[]}"#).unwrap();
        assert!(matches!(parsed.first_text(), Err(BackendError::InvalidResponse(_))));
    }

    #[test]
    fn test_request_body_shape() {
        let body = MessagesRequest {
            model: DEFAULT_MODEL,
            max_tokens: 10,
            temperature: 0.0,
            system: Some("sys"),
            messages: vec![Message {
                role: "user",
                content: vec![ContentBlock {
                    kind: "text".to_string(),
                    text: "hi".to_string(),
                }],
            }],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["system"], "sys");
        assert_eq!(json["messages"][0]["content"][0]["type"], "text");
        assert_eq!(json["messages"][0]["content"][0]["text"], "hi");
    }
}
