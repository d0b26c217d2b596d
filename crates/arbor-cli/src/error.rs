//! Error types for the CLI application.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// A file could not be read
    #[error("Failed to read {}: {source}", .path.display())]
    ReadFile {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A model backend could not be created
    #[error("Model '{name}': {source}")]
    Model {
        /// Model table entry
        name: String,
        /// Underlying error
        source: arbor_domain::BackendError,
    },

    /// The tree definition is invalid
    #[error("Invalid tree: {0}")]
    Tree(#[from] arbor_extractor::ConfigError),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
