//! Arbor Domain Layer
//!
//! This crate defines the contract between the extraction core and the model
//! backends it queries. It carries no I/O and no model logic of its own.
//!
//! ## Key Concepts
//!
//! - **Model description**: what call shape a backend supports (text or
//!   classifier, with or without scores)
//! - **Query**: a free-text instruction, or the candidate labels for a classifier
//! - **Sentinel `NA`**: the answer meaning "no usable answer found"
//!
//! ## Architecture
//!
//! - Pure types and traits only
//! - Backend implementations live in `arbor-llm`
//! - The extraction engine lives in `arbor-extractor`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod model;
pub mod traits;

// Re-exports for convenience
pub use error::BackendError;
pub use model::{Instructions, ModelDescription, ModelKind, Query, ScoredAnswer};
pub use traits::ModelBackend;

/// Answer meaning "no usable answer found".
///
/// Backends answer with it when the context holds nothing relevant, and the
/// extractors return it when no chunk produced a valid answer.
pub const NA: &str = "NA";

/// Returns true if `answer` is the `NA` sentinel.
pub fn is_na(answer: &str) -> bool {
    answer == NA
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_na_exact_match_only() {
        assert!(is_na("NA"));
        assert!(!is_na("na"));
        assert!(!is_na(" NA"));
        assert!(!is_na(""));
    }
}
