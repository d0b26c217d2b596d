//! Hosted Hugging Face question-answering endpoint
//!
//! Extractive QA models return a span of the context plus a confidence score,
//! so this backend declares `scores: true` and the extractors pick the best
//! scoring chunk instead of voting.

use crate::blocking_runtime;
use arbor_domain::{
    BackendError, Instructions, ModelBackend, ModelDescription, Query, ScoredAnswer,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// Environment variable holding the API token
pub const API_TOKEN_ENV: &str = "HF_API_TOKEN";

/// Scored QA backend on a hosted inference endpoint
pub struct HfEndpointModel {
    url: String,
    api_token: String,
    client: reqwest::Client,
    runtime: tokio::runtime::Runtime,
}

#[derive(Serialize)]
struct QaRequest<'a> {
    inputs: QaInputs<'a>,
}

#[derive(Serialize)]
struct QaInputs<'a> {
    question: &'a str,
    context: &'a str,
}

#[derive(Debug, Deserialize)]
struct QaResponse {
    answer: String,
    score: f64,
}

/// Pick the explicit token, else the environment's, rejecting empty values
fn resolve_token(
    explicit: Option<String>,
    from_env: Option<String>,
) -> Result<String, BackendError> {
    explicit
        .or(from_env)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            BackendError::Other(format!(
                "The Hugging Face API requires a token. Pass one or set {}",
                API_TOKEN_ENV
            ))
        })
}

impl HfEndpointModel {
    /// Create a backend for the endpoint at `url`
    ///
    /// The token falls back to the `HF_API_TOKEN` environment variable; having
    /// neither is an error.
    pub fn new(url: impl Into<String>, api_token: Option<String>) -> Result<Self, BackendError> {
        let api_token = resolve_token(api_token, std::env::var(API_TOKEN_ENV).ok())?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| BackendError::Other(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            api_token,
            client,
            runtime: blocking_runtime()?,
        })
    }

    async fn ask(&self, question: &str, context: &str) -> Result<QaResponse, BackendError> {
        let body = QaRequest {
            inputs: QaInputs { question, context },
        };
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| BackendError::Communication(format!("Request failed: {}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(BackendError::RateLimited);
        }
        if !status.is_success() {
            return Err(BackendError::Communication(format!("HTTP {}", status)));
        }

        response
            .json::<QaResponse>()
            .await
            .map_err(|e| BackendError::InvalidResponse(format!("Failed to parse response: {}", e)))
    }
}

impl ModelBackend for HfEndpointModel {
    fn describe(&self) -> ModelDescription {
        ModelDescription::scored_text()
    }

    fn complete(
        &self,
        query: &Query<'_>,
        context: &str,
        _instructions: &Instructions<'_>,
    ) -> Result<String, BackendError> {
        let question = query.to_prompt_text();
        self.runtime
            .block_on(self.ask(&question, context))
            .map(|r| r.answer)
    }

    fn batch_complete_with_scores(
        &self,
        query: &Query<'_>,
        contexts: &[String],
        _instructions: &Instructions<'_>,
    ) -> Result<Vec<ScoredAnswer>, BackendError> {
        let question = query.to_prompt_text();
        Ok(contexts
            .iter()
            .enumerate()
            .map(|(idx, context)| match self.runtime.block_on(self.ask(&question, context)) {
                Ok(r) => ScoredAnswer::new(r.answer, r.score),
                Err(e) => {
                    warn!("Chunk {} failed on Hugging Face endpoint: {}", idx, e);
                    ScoredAnswer::na()
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_token_wins() {
        let token = resolve_token(Some("abc".to_string()), Some("env".to_string())).unwrap();
        assert_eq!(token, "abc");
    }

    #[test]
    fn test_env_token_fallback() {
        let token = resolve_token(None, Some("env".to_string())).unwrap();
        assert_eq!(token, "env");
    }

    #[test]
    fn test_missing_token_is_error() {
        assert!(resolve_token(None, None).is_err());
        assert!(resolve_token(Some(String::new()), None).is_err());
    }

    #[test]
    fn test_describe_is_scored_text() {
        let model = HfEndpointModel::new("http://localhost:99999", Some("t".to_string())).unwrap();
        assert_eq!(model.describe(), ModelDescription::scored_text());
    }

    #[test]
    fn test_unreachable_endpoint_downgrades_each_chunk() {
        let model = HfEndpointModel::new("http://localhost:99999", Some("t".to_string())).unwrap();
        let answers = model
            .batch_complete_with_scores(
                &Query::Instruction("What is the rent?"),
                &["a".to_string(), "b".to_string()],
                &Instructions::default(),
            )
            .unwrap();
        assert_eq!(answers, vec![ScoredAnswer::na(), ScoredAnswer::na()]);
    }

    #[test]
    fn test_parse_qa_response() {
        let parsed: QaResponse =
            serde_json::from_str(r#"{"answer":"1200","score":0.87,"start":5,"end":9}"#).unwrap();
        assert_eq!(parsed.answer, "1200");
        assert!((parsed.score - 0.87).abs() < 1e-12);
    }
}
