//! Configuration file for the CLI.
//!
//! One TOML file carries the model table and the tree definition:
//!
//! ```toml
//! [models.local]
//! provider = "ollama"
//! model = "llama3"
//!
//! [root]
//! name = "doc_type"
//! kind = "category"
//! query = "What kind of contract is this?"
//! model = "local"
//! categories = ["lease", "employment"]
//! ```

use crate::error::{CliError, Result};
use arbor_domain::{BackendError, ModelBackend};
use arbor_extractor::{ModelTable, Node, TreeConfig};
use arbor_llm::{AnthropicModel, HfEndpointModel, MockModel, OllamaModel, ScoredMockModel};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// CLI configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArborConfig {
    /// Model backends by name
    #[serde(default)]
    pub models: BTreeMap<String, ModelConfig>,

    /// Tree definition
    #[serde(flatten)]
    pub tree: TreeConfig,
}

/// One model backend entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "kebab-case")]
pub enum ModelConfig {
    /// Echoes each chunk back, unscored
    Mock,

    /// Echoes each chunk back; later chunks score higher
    MockScored,

    /// Local Ollama server
    Ollama {
        /// Model tag, e.g. "llama3"
        model: String,
        /// Server URL; defaults to the local Ollama port
        #[serde(default, skip_serializing_if = "Option::is_none")]
        endpoint: Option<String>,
        /// Attempts per request
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_retries: Option<u32>,
    },

    /// Anthropic Messages API
    Anthropic {
        /// Model identifier
        #[serde(default, skip_serializing_if = "Option::is_none")]
        model: Option<String>,
        /// API key; falls back to `ANTHROPIC_API_KEY`
        #[serde(default, skip_serializing_if = "Option::is_none")]
        api_key: Option<String>,
        /// Messages API URL; defaults to the public API
        #[serde(default, skip_serializing_if = "Option::is_none")]
        endpoint: Option<String>,
        /// Sampling temperature
        #[serde(default, skip_serializing_if = "Option::is_none")]
        temperature: Option<f64>,
        /// Answer length limit
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_tokens: Option<u32>,
        /// Attempts per request
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_retries: Option<u32>,
    },

    /// Hosted question-answering endpoint (scored)
    HfEndpoint {
        /// Endpoint URL
        url: String,
        /// Bearer token; falls back to `HF_API_TOKEN`
        #[serde(default, skip_serializing_if = "Option::is_none")]
        api_token: Option<String>,
    },
}

impl ModelConfig {
    /// Provider name as written in the configuration file.
    pub fn provider(&self) -> &'static str {
        match self {
            ModelConfig::Mock => "mock",
            ModelConfig::MockScored => "mock-scored",
            ModelConfig::Ollama { .. } => "ollama",
            ModelConfig::Anthropic { .. } => "anthropic",
            ModelConfig::HfEndpoint { .. } => "hf-endpoint",
        }
    }

    /// Create the backend this entry describes.
    pub fn build(&self) -> std::result::Result<Arc<dyn ModelBackend>, BackendError> {
        let backend: Arc<dyn ModelBackend> = match self {
            ModelConfig::Mock => Arc::new(MockModel::new()),
            ModelConfig::MockScored => Arc::new(ScoredMockModel::new()),
            ModelConfig::Ollama {
                model,
                endpoint,
                max_retries,
            } => {
                let mut backend = match endpoint {
                    Some(endpoint) => OllamaModel::new(endpoint.as_str(), model.as_str())?,
                    None => OllamaModel::default_endpoint(model.as_str())?,
                };
                if let Some(max_retries) = max_retries {
                    backend = backend.with_max_retries(*max_retries);
                }
                Arc::new(backend)
            }
            ModelConfig::Anthropic {
                model,
                api_key,
                endpoint,
                temperature,
                max_tokens,
                max_retries,
            } => {
                let mut backend = AnthropicModel::new(model.clone(), api_key.clone())?;
                if let Some(endpoint) = endpoint {
                    backend = backend.with_endpoint(endpoint.as_str());
                }
                if let Some(temperature) = temperature {
                    backend = backend.with_temperature(*temperature);
                }
                if let Some(max_tokens) = max_tokens {
                    backend = backend.with_max_tokens(*max_tokens);
                }
                if let Some(max_retries) = max_retries {
                    backend = backend.with_max_retries(*max_retries);
                }
                Arc::new(backend)
            }
            ModelConfig::HfEndpoint { url, api_token } => {
                Arc::new(HfEndpointModel::new(url.as_str(), api_token.clone())?)
            }
        };
        Ok(backend)
    }
}

impl ArborConfig {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|source| CliError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Create every configured model backend.
    pub fn models(&self) -> Result<ModelTable> {
        self.models
            .iter()
            .map(|(name, config)| {
                debug!("Creating model '{}' ({})", name, config.provider());
                let backend = config.build().map_err(|source| CliError::Model {
                    name: name.clone(),
                    source,
                })?;
                Ok((name.clone(), backend))
            })
            .collect()
    }

    /// Create the models and build the extraction tree.
    pub fn build_tree(&self) -> Result<Node> {
        let models = self.models()?;
        Ok(self.tree.build(&models)?)
    }
}
