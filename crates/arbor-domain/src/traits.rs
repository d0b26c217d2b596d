//! Trait definitions for external interactions
//!
//! These traits define the boundary between the extraction core and the model
//! infrastructure. Implementations live in other crates.

use crate::{BackendError, Instructions, ModelDescription, Query, ScoredAnswer, NA};

/// A language or classification model the extractors can query
///
/// Implemented by the infrastructure layer (arbor-llm). Which methods must be
/// overridden depends on what [`describe`](ModelBackend::describe) declares:
/// a backend reporting `scores: true` must implement
/// [`batch_complete_with_scores`](ModelBackend::batch_complete_with_scores),
/// every other backend is served through
/// [`batch_complete`](ModelBackend::batch_complete).
///
/// Backends are shared between extractors and between threads, so they must
/// be safe to call concurrently or stateless per call.
pub trait ModelBackend: Send + Sync {
    /// Declared call shape
    fn describe(&self) -> ModelDescription;

    /// Answer `query` from a single context
    fn complete(
        &self,
        query: &Query<'_>,
        context: &str,
        instructions: &Instructions<'_>,
    ) -> Result<String, BackendError>;

    /// Answer `query` independently for every context
    ///
    /// The default calls [`complete`](ModelBackend::complete) once per context.
    /// A context that fails is answered with `NA` so one bad chunk does not
    /// poison the whole batch.
    fn batch_complete(
        &self,
        query: &Query<'_>,
        contexts: &[String],
        instructions: &Instructions<'_>,
    ) -> Result<Vec<String>, BackendError> {
        Ok(contexts
            .iter()
            .map(|context| {
                self.complete(query, context, instructions)
                    .unwrap_or_else(|_| NA.to_string())
            })
            .collect())
    }

    /// Answer `query` for every context, with a confidence score per answer
    fn batch_complete_with_scores(
        &self,
        _query: &Query<'_>,
        _contexts: &[String],
        _instructions: &Instructions<'_>,
    ) -> Result<Vec<ScoredAnswer>, BackendError> {
        Err(BackendError::Unsupported(
            "batch_complete_with_scores is not implemented by this backend".to_string(),
        ))
    }
}
