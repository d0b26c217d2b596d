//! Arbor Model Backend Layer
//!
//! Pluggable model backends implementing the `ModelBackend` trait from
//! `arbor-domain`.
//!
//! # Backends
//!
//! - `MockModel`: echoes each context, no scores
//! - `ScoredMockModel`: echoes each context, later chunks score higher
//! - `ScriptedModel`: replays queued answers and records every call, for tests
//! - `OllamaModel`: local Ollama API integration
//! - `AnthropicModel`: Anthropic Messages API
//! - `HfEndpointModel`: hosted Hugging Face question-answering endpoint (scored)
//!
//! Retry and backoff policy belongs to the HTTP backends in this crate. The
//! extraction core treats every call as one atomic, possibly failing request.
//!
//! # Examples
//!
//! ```
//! use arbor_domain::{Instructions, ModelBackend, Query};
//! use arbor_llm::MockModel;
//!
//! let model = MockModel::new();
//! let answer = model
//!     .complete(&Query::Instruction("What is this?"), "lease\n", &Instructions::default())
//!     .unwrap();
//! assert_eq!(answer, "lease");
//! ```

#![warn(missing_docs)]

pub mod anthropic;
pub mod hf_endpoint;
pub mod mock;
pub mod ollama;

use arbor_domain::{BackendError, Instructions, Query};

pub use anthropic::AnthropicModel;
pub use hf_endpoint::HfEndpointModel;
pub use mock::{CallKind, MockModel, RecordedCall, ScoredMockModel, ScriptedModel};
pub use ollama::OllamaModel;

/// Build the runtime an HTTP backend drives its async client on
///
/// Backends expose a blocking contract, so each one owns a small
/// current-thread runtime instead of assuming the caller has one.
pub(crate) fn blocking_runtime() -> Result<tokio::runtime::Runtime, BackendError> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| BackendError::Other(format!("Failed to start runtime: {}", e)))
}

/// Assemble the user prompt sent to chat and completion backends
///
/// Layout is query, then the task description if any, then the context, one
/// per line.
pub(crate) fn user_prompt(
    query: &Query<'_>,
    context: &str,
    instructions: &Instructions<'_>,
) -> String {
    let query = query.to_prompt_text();
    match instructions.task_description {
        Some(task) => format!("{}\n{}\n{}", query, task, context),
        None => format!("{}\n{}", query, context),
    }
}
