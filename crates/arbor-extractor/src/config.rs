//! Declarative tree configuration
//!
//! A tree is described in TOML and built against a table of named model
//! backends supplied by the caller:
//!
//! ```toml
//! [defaults]
//! max_chunk_size = 2000
//!
//! [root]
//! name = "doc_type"
//! kind = "category"
//! query = "What kind of contract is this?"
//! model = "classifier"
//! categories = ["lease", "employment"]
//! first_chunk_only = true
//!
//! [[root.children.lease]]
//! name = "rent"
//! kind = "numeric"
//! query = "What is the monthly rent?"
//! model = "local"
//! ```

use crate::error::ConfigError;
use crate::extractor::{Extractor, DEFAULT_MAX_CHUNK_SIZE};
use crate::node::Node;
use arbor_domain::ModelBackend;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Named model backends a tree definition may reference
pub type ModelTable = HashMap<String, Arc<dyn ModelBackend>>;

/// Chunking settings applied to nodes that do not set their own
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorDefaults {
    /// Maximum chunk size (characters)
    pub max_chunk_size: usize,

    /// Send only the first chunk of each document
    pub first_chunk_only: bool,
}

impl ExtractorDefaults {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_chunk_size == 0 {
            return Err(ConfigError::Invalid(
                "max_chunk_size must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

impl Default for ExtractorDefaults {
    fn default() -> Self {
        Self {
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            first_chunk_only: false,
        }
    }
}

/// Extractor variant named in a node definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractorKindConfig {
    /// Category extractor; requires `categories`
    Category,
    /// Numeric extractor
    Numeric,
    /// Free-text extractor
    Text,
}

/// One node of a tree definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeConfig {
    /// Extractor name, unique within the tree
    pub name: String,

    /// Extractor variant
    pub kind: ExtractorKindConfig,

    /// Task query sent to the model
    pub query: String,

    /// Name of the model backend in the caller's model table
    pub model: String,

    /// Allowed labels (category nodes only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,

    /// Overrides the default chunk size
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_chunk_size: Option<usize>,

    /// Overrides the default first-chunk-only setting
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_chunk_only: Option<bool>,

    /// Child nodes keyed by the category label that selects them
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub children: BTreeMap<String, Vec<NodeConfig>>,
}

impl NodeConfig {
    fn build(
        &self,
        defaults: &ExtractorDefaults,
        models: &ModelTable,
    ) -> Result<Node, ConfigError> {
        let model = models
            .get(&self.model)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownModel {
                node: self.name.clone(),
                model: self.model.clone(),
            })?;

        let extractor = match (self.kind, &self.categories) {
            (ExtractorKindConfig::Category, Some(categories)) => {
                Extractor::category(&self.name, &self.query, categories.iter().cloned(), model)?
            }
            (ExtractorKindConfig::Category, None) => {
                return Err(ConfigError::MissingCategories {
                    node: self.name.clone(),
                })
            }
            (_, Some(_)) => {
                return Err(ConfigError::UnexpectedCategories {
                    node: self.name.clone(),
                })
            }
            (ExtractorKindConfig::Numeric, None) => {
                Extractor::numeric(&self.name, &self.query, model)?
            }
            (ExtractorKindConfig::Text, None) => Extractor::text(&self.name, &self.query, model)?,
        };

        let extractor = extractor
            .with_max_chunk_size(self.max_chunk_size.unwrap_or(defaults.max_chunk_size))?
            .with_first_chunk_only(self.first_chunk_only.unwrap_or(defaults.first_chunk_only));

        let children = self
            .children
            .iter()
            .map(|(label, nodes)| {
                let built = nodes
                    .iter()
                    .map(|node| node.build(defaults, models))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok((label.clone(), built))
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(Node::new(extractor, children)?)
    }
}

/// A complete tree definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Settings for nodes that do not override them
    #[serde(default)]
    pub defaults: ExtractorDefaults,

    /// Root node
    pub root: NodeConfig,
}

impl TreeConfig {
    /// Load a tree definition from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize the tree definition to TOML string
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Build the tree, resolving model names against `models`
    ///
    /// Every node is validated; the first problem found is returned.
    pub fn build(&self, models: &ModelTable) -> Result<Node, ConfigError> {
        self.defaults.validate()?;
        self.root.build(&self.defaults, models)
    }
}
