//! Errors raised by model backends

use thiserror::Error;

/// Errors that can occur while a backend answers a request
///
/// These never reach the caller of a tree extraction: the core downgrades
/// them to the `NA` sentinel for the affected chunks.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Response could not be understood
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded and retries were exhausted
    #[error("Rate limit exceeded")]
    RateLimited,

    /// Model not available on the backend
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// The backend does not implement the requested call shape
    #[error("Unsupported call: {0}")]
    Unsupported(String),

    /// Generic error
    #[error("Backend error: {0}")]
    Other(String),
}
