//! Error types for tree construction and configuration

use thiserror::Error;

/// Structural errors raised while building extractors and trees
///
/// All of these are detected at construction time. Extraction itself never
/// fails; missing answers surface as the `NA` value instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// Extractor name is empty
    #[error("Extractor name must not be empty")]
    EmptyName,

    /// Chunk size bound is not positive
    #[error("Extractor '{name}': max_chunk_size must be greater than 0")]
    InvalidChunkSize {
        /// Extractor name
        name: String,
    },

    /// Category extractor declared without categories
    #[error("Extractor '{name}': at least one category is required")]
    EmptyCategories {
        /// Extractor name
        name: String,
    },

    /// The same category appears twice
    #[error("Extractor '{name}': category '{category}' is declared more than once")]
    DuplicateCategory {
        /// Extractor name
        name: String,
        /// Repeated category
        category: String,
    },

    /// The `NA` sentinel was declared as a category
    #[error("Extractor '{name}': 'NA' is reserved and cannot be a category")]
    ReservedCategory {
        /// Extractor name
        name: String,
    },

    /// A numeric or text extractor was bound to a classifier backend
    #[error("Extractor '{name}': a {kind} extractor cannot use a classifier model")]
    IncompatibleModel {
        /// Extractor name
        name: String,
        /// Extractor kind
        kind: &'static str,
    },

    /// Children attached to a non-category extractor
    #[error("Node '{name}': children are only supported for category extractors")]
    ChildrenOnNonCategory {
        /// Extractor name
        name: String,
    },

    /// A child branch keyed by a label the parent cannot produce
    #[error("Node '{name}': child branch '{label}' is not one of its categories")]
    UnknownChildCategory {
        /// Extractor name
        name: String,
        /// Offending branch label
        label: String,
    },

    /// Extractor names repeated within one tree
    #[error("Duplicate extractor names in tree: {}", .names.join(", "))]
    DuplicateName {
        /// Every name that occurs more than once
        names: Vec<String>,
    },
}

/// Errors raised while loading a declarative tree definition
#[derive(Error, Debug)]
pub enum ConfigError {
    /// TOML could not be parsed
    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// Configuration could not be serialized
    #[error("Failed to serialize to TOML: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A setting is out of range
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// A node references a model that was not supplied
    #[error("Node '{node}' references unknown model '{model}'")]
    UnknownModel {
        /// Node name
        node: String,
        /// Model name
        model: String,
    },

    /// A category node has no `categories` list
    #[error("Node '{node}' is a category extractor but lists no categories")]
    MissingCategories {
        /// Node name
        node: String,
    },

    /// A numeric or text node lists categories
    #[error("Node '{node}' lists categories but is not a category extractor")]
    UnexpectedCategories {
        /// Node name
        node: String,
    },

    /// The tree violates a structural invariant
    #[error(transparent)]
    Tree(#[from] TreeError),
}
