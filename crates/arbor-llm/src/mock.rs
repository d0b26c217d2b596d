//! Deterministic backends for tests and dry runs
//!
//! None of these make network calls.

use arbor_domain::{
    BackendError, Instructions, ModelBackend, ModelDescription, Query, ScoredAnswer, NA,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

/// Echo backend: answers with the context itself, newlines removed
///
/// # Examples
///
/// ```
/// use arbor_domain::{Instructions, ModelBackend, Query};
/// use arbor_llm::MockModel;
///
/// let contexts = vec!["lease".to_string(), "\nemployment".to_string()];
/// let answers = MockModel::new()
///     .batch_complete(&Query::Instruction("?"), &contexts, &Instructions::default())
///     .unwrap();
/// assert_eq!(answers, vec!["lease", "employment"]);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MockModel;

impl MockModel {
    /// Create an echo backend
    pub fn new() -> Self {
        Self
    }
}

impl ModelBackend for MockModel {
    fn describe(&self) -> ModelDescription {
        ModelDescription::text()
    }

    fn complete(
        &self,
        _query: &Query<'_>,
        context: &str,
        _instructions: &Instructions<'_>,
    ) -> Result<String, BackendError> {
        Ok(context.replace('\n', ""))
    }
}

/// Scored echo backend
///
/// Answers like [`MockModel`]; the i-th context of a batch scores
/// `log10(i + 1)`, so the last chunk always wins a score-based pick.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoredMockModel;

impl ScoredMockModel {
    /// Create a scored echo backend
    pub fn new() -> Self {
        Self
    }
}

impl ModelBackend for ScoredMockModel {
    fn describe(&self) -> ModelDescription {
        ModelDescription::scored_text()
    }

    fn complete(
        &self,
        _query: &Query<'_>,
        context: &str,
        _instructions: &Instructions<'_>,
    ) -> Result<String, BackendError> {
        Ok(context.replace('\n', ""))
    }

    fn batch_complete_with_scores(
        &self,
        query: &Query<'_>,
        contexts: &[String],
        instructions: &Instructions<'_>,
    ) -> Result<Vec<ScoredAnswer>, BackendError> {
        contexts
            .iter()
            .enumerate()
            .map(|(i, context)| {
                let answer = self.complete(query, context, instructions)?;
                Ok(ScoredAnswer::new(answer, ((i + 1) as f64).log10()))
            })
            .collect()
    }
}

/// Which backend method a [`RecordedCall`] went through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    /// `complete`
    Single,
    /// `batch_complete`
    Batch,
    /// `batch_complete_with_scores`
    ScoredBatch,
}

/// A request observed by a [`ScriptedModel`]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    /// Method used
    pub kind: CallKind,
    /// Instruction text, if the query was an instruction
    pub instruction: Option<String>,
    /// Candidate labels, if the query was a label list
    pub labels: Option<Vec<String>>,
    /// Contexts sent, in order
    pub contexts: Vec<String>,
    /// Task description sent, if any
    pub task_description: Option<String>,
}

#[derive(Debug, Default)]
struct Script {
    answers: VecDeque<ScoredAnswer>,
    calls: Vec<RecordedCall>,
}

/// Backend that replays a queue of answers
///
/// Every context consumes the next queued answer; once the queue is empty the
/// answer is `NA`. Calls are recorded so tests can assert what was sent.
/// Clones share the same queue and call log.
///
/// # Examples
///
/// ```
/// use arbor_domain::{Instructions, ModelBackend, ModelDescription, Query};
/// use arbor_llm::ScriptedModel;
///
/// let model = ScriptedModel::new(ModelDescription::text())
///     .with_answers(["lease", "employment"]);
/// let contexts = vec!["a".to_string(), "b".to_string(), "c".to_string()];
/// let answers = model
///     .batch_complete(&Query::Instruction("?"), &contexts, &Instructions::default())
///     .unwrap();
/// assert_eq!(answers, vec!["lease", "employment", "NA"]);
/// assert_eq!(model.call_count(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct ScriptedModel {
    description: ModelDescription,
    script: Arc<Mutex<Script>>,
    fail_batches: bool,
    truncate_batches_to: Option<usize>,
}

impl ScriptedModel {
    /// Create an empty script with the given declared call shape
    pub fn new(description: ModelDescription) -> Self {
        Self {
            description,
            script: Arc::new(Mutex::new(Script::default())),
            fail_batches: false,
            truncate_batches_to: None,
        }
    }

    /// Queue unscored answers (score 0.0)
    pub fn with_answers<I, S>(self, answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(answers.into_iter().map(|a| ScoredAnswer::new(a, 0.0)));
        self
    }

    /// Queue scored answers
    pub fn with_scored_answers<I, S>(self, answers: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        self.push(answers.into_iter().map(|(a, s)| ScoredAnswer::new(a, s)));
        self
    }

    /// Make every batch call fail as a whole
    pub fn failing(mut self) -> Self {
        self.fail_batches = true;
        self
    }

    /// Return at most `len` answers per batch, simulating a malformed response
    pub fn truncating_batches_to(mut self, len: usize) -> Self {
        self.truncate_batches_to = Some(len);
        self
    }

    /// Number of backend calls observed
    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    /// Every backend call observed, oldest first
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    fn push(&self, answers: impl Iterator<Item = ScoredAnswer>) {
        self.lock().answers.extend(answers);
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        // A panicking test thread must not hide the log from the others
        self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn run(
        &self,
        kind: CallKind,
        query: &Query<'_>,
        contexts: &[String],
        instructions: &Instructions<'_>,
    ) -> Result<Vec<ScoredAnswer>, BackendError> {
        let mut script = self.lock();
        let (instruction, labels) = match query {
            Query::Instruction(text) => (Some((*text).to_string()), None),
            Query::Labels(labels) => (None, Some(labels.to_vec())),
        };
        script.calls.push(RecordedCall {
            kind,
            instruction,
            labels,
            contexts: contexts.to_vec(),
            task_description: instructions.task_description.map(str::to_string),
        });

        if self.fail_batches && kind != CallKind::Single {
            return Err(BackendError::Communication("scripted failure".to_string()));
        }

        let mut answers: Vec<ScoredAnswer> = contexts
            .iter()
            .map(|_| script.answers.pop_front().unwrap_or_else(ScoredAnswer::na))
            .collect();
        if let Some(len) = self.truncate_batches_to {
            answers.truncate(len);
        }
        Ok(answers)
    }
}

impl ModelBackend for ScriptedModel {
    fn describe(&self) -> ModelDescription {
        self.description
    }

    fn complete(
        &self,
        query: &Query<'_>,
        context: &str,
        instructions: &Instructions<'_>,
    ) -> Result<String, BackendError> {
        let answers = self.run(CallKind::Single, query, &[context.to_string()], instructions)?;
        Ok(answers
            .into_iter()
            .next()
            .map(|a| a.answer)
            .unwrap_or_else(|| NA.to_string()))
    }

    fn batch_complete(
        &self,
        query: &Query<'_>,
        contexts: &[String],
        instructions: &Instructions<'_>,
    ) -> Result<Vec<String>, BackendError> {
        let answers = self.run(CallKind::Batch, query, contexts, instructions)?;
        Ok(answers.into_iter().map(|a| a.answer).collect())
    }

    fn batch_complete_with_scores(
        &self,
        query: &Query<'_>,
        contexts: &[String],
        instructions: &Instructions<'_>,
    ) -> Result<Vec<ScoredAnswer>, BackendError> {
        if !self.description.scores {
            return Err(BackendError::Unsupported(
                "scripted model was declared without scores".to_string(),
            ));
        }
        self.run(CallKind::ScoredBatch, query, contexts, instructions)
    }
}
