//! Core Extractor implementation

use crate::chunking::TextChunker;
use crate::consensus::{resolve, ChunkAnswers};
use crate::error::TreeError;
use crate::normalize::normalize_numeric;
use crate::prompt::PromptTemplate;
use arbor_domain::{is_na, ModelBackend, ModelDescription, ModelKind, Query, ScoredAnswer, NA};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Default chunk size bound, in characters
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 10_000;

/// What an extractor produces, and how its answers are filtered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractorKind {
    /// One of a fixed set of labels; only exact matches count
    Category {
        /// Allowed labels, in declared order
        categories: Vec<String>,
    },
    /// A number, normalized to a plain token before voting
    Numeric,
    /// Free text, taken verbatim
    Text,
}

impl ExtractorKind {
    /// Stable lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractorKind::Category { .. } => "category",
            ExtractorKind::Numeric => "numeric",
            ExtractorKind::Text => "text",
        }
    }
}

/// Turns document text into one value using a model backend
///
/// An extractor is built once and reused for any number of documents; it keeps
/// no state between calls.
#[derive(Clone)]
pub struct Extractor {
    name: String,
    query: String,
    kind: ExtractorKind,
    model: Arc<dyn ModelBackend>,
    max_chunk_size: usize,
    first_chunk_only: bool,
    prompt: PromptTemplate,
}

impl Extractor {
    /// Create a category extractor
    ///
    /// Fails if `categories` is empty, repeats a label, or contains `NA`.
    pub fn category<I, S>(
        name: impl Into<String>,
        query: impl Into<String>,
        categories: I,
        model: Arc<dyn ModelBackend>,
    ) -> Result<Self, TreeError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        let categories: Vec<String> = categories.into_iter().map(Into::into).collect();

        if categories.is_empty() {
            return Err(TreeError::EmptyCategories { name });
        }
        let mut seen = HashSet::new();
        for category in &categories {
            if is_na(category) {
                return Err(TreeError::ReservedCategory { name });
            }
            if !seen.insert(category.as_str()) {
                return Err(TreeError::DuplicateCategory {
                    name,
                    category: category.clone(),
                });
            }
        }

        let prompt = PromptTemplate::category(&categories);
        Self::build(name, query.into(), ExtractorKind::Category { categories }, model, prompt)
    }

    /// Create a numeric extractor
    pub fn numeric(
        name: impl Into<String>,
        query: impl Into<String>,
        model: Arc<dyn ModelBackend>,
    ) -> Result<Self, TreeError> {
        Self::build(
            name.into(),
            query.into(),
            ExtractorKind::Numeric,
            model,
            PromptTemplate::numeric(),
        )
    }

    /// Create a free-text extractor
    pub fn text(
        name: impl Into<String>,
        query: impl Into<String>,
        model: Arc<dyn ModelBackend>,
    ) -> Result<Self, TreeError> {
        Self::build(name.into(), query.into(), ExtractorKind::Text, model, PromptTemplate::text())
    }

    fn build(
        name: String,
        query: String,
        kind: ExtractorKind,
        model: Arc<dyn ModelBackend>,
        prompt: PromptTemplate,
    ) -> Result<Self, TreeError> {
        if name.is_empty() {
            return Err(TreeError::EmptyName);
        }
        let is_category = matches!(kind, ExtractorKind::Category { .. });
        if !is_category && model.describe().kind == ModelKind::Classifier {
            return Err(TreeError::IncompatibleModel {
                name,
                kind: kind.as_str(),
            });
        }

        Ok(Self {
            name,
            query,
            kind,
            model,
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            first_chunk_only: false,
            prompt,
        })
    }

    /// Set the chunk size bound, in characters
    pub fn with_max_chunk_size(mut self, max_chunk_size: usize) -> Result<Self, TreeError> {
        if max_chunk_size == 0 {
            return Err(TreeError::InvalidChunkSize { name: self.name });
        }
        self.max_chunk_size = max_chunk_size;
        Ok(self)
    }

    /// Only send the document's first chunk to the model
    ///
    /// Useful when the opening of a document is enough, e.g. classification.
    pub fn with_first_chunk_only(mut self, first_chunk_only: bool) -> Self {
        self.first_chunk_only = first_chunk_only;
        self
    }

    /// Unique name; also the key of this extractor's value in results
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Natural-language task query
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Extractor kind
    pub fn kind(&self) -> &ExtractorKind {
        &self.kind
    }

    /// Allowed labels, for category extractors
    pub fn categories(&self) -> Option<&[String]> {
        match &self.kind {
            ExtractorKind::Category { categories } => Some(categories),
            _ => None,
        }
    }

    /// Chunk size bound, in characters
    pub fn max_chunk_size(&self) -> usize {
        self.max_chunk_size
    }

    /// Whether only the first chunk is sent
    pub fn first_chunk_only(&self) -> bool {
        self.first_chunk_only
    }

    /// Declared call shape of the backing model
    pub fn model_description(&self) -> ModelDescription {
        self.model.describe()
    }

    /// Extract this extractor's value from `doc_text`
    ///
    /// Never fails: backend errors and answers that fail the kind's filter
    /// count as `NA`, and with no usable answer at all the result is `NA`.
    pub fn extract(&self, doc_text: &str) -> String {
        let chunks = TextChunker::new(self.max_chunk_size, self.first_chunk_only).chunk(doc_text);
        let description = self.model.describe();

        // Classifiers score candidate labels rather than follow instructions
        let query = match (&self.kind, description.kind) {
            (ExtractorKind::Category { categories }, ModelKind::Classifier) => {
                Query::Labels(categories)
            }
            _ => Query::Instruction(&self.query),
        };

        debug!(
            "Extractor '{}': {} chunk(s), {} model, scores={}",
            self.name,
            chunks.len(),
            description.kind,
            description.scores
        );

        let answers = self.dispatch(&query, &chunks, description.scores);
        let value = match &self.kind {
            ExtractorKind::Category { categories } => resolve(answers, |answer| {
                categories
                    .iter()
                    .any(|c| c == answer)
                    .then(|| answer.to_string())
            }),
            ExtractorKind::Numeric => resolve(answers, |answer| {
                if is_na(answer) {
                    None
                } else {
                    normalize_numeric(answer)
                }
            }),
            ExtractorKind::Text => resolve(answers, |answer| {
                (!is_na(answer)).then(|| answer.to_string())
            }),
        };

        info!("Extractor '{}' resolved to '{}'", self.name, value);
        value
    }

    /// Issue the single batch call for all chunks
    ///
    /// Always yields exactly one answer per chunk.
    fn dispatch(&self, query: &Query<'_>, chunks: &[String], scored: bool) -> ChunkAnswers {
        let instructions = self.prompt.instructions();

        if scored {
            let answers = self
                .model
                .batch_complete_with_scores(query, chunks, &instructions)
                .unwrap_or_else(|e| {
                    warn!("Extractor '{}': scored batch call failed: {}", self.name, e);
                    Vec::new()
                });
            ChunkAnswers::Scored(self.align(answers, chunks.len(), ScoredAnswer::na))
        } else {
            let answers = self
                .model
                .batch_complete(query, chunks, &instructions)
                .unwrap_or_else(|e| {
                    warn!("Extractor '{}': batch call failed: {}", self.name, e);
                    Vec::new()
                });
            ChunkAnswers::Unscored(self.align(answers, chunks.len(), || NA.to_string()))
        }
    }

    /// Pad with `NA` or truncate so there is one answer per chunk
    fn align<T>(&self, mut answers: Vec<T>, expected: usize, na: impl Fn() -> T) -> Vec<T> {
        if answers.len() != expected {
            warn!(
                "Extractor '{}': backend returned {} answer(s) for {} chunk(s)",
                self.name,
                answers.len(),
                expected
            );
            answers.resize_with(expected, na);
        }
        answers
    }
}

impl fmt::Debug for Extractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extractor")
            .field("name", &self.name)
            .field("query", &self.query)
            .field("kind", &self.kind)
            .field("model", &self.model.describe())
            .field("max_chunk_size", &self.max_chunk_size)
            .field("first_chunk_only", &self.first_chunk_only)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_llm::{CallKind, MockModel, ScriptedModel};

    fn scripted(description: ModelDescription) -> ScriptedModel {
        ScriptedModel::new(description)
    }

    fn lines(n: usize) -> String {
        (0..n).map(|i| format!("line {}", i)).collect::<Vec<_>>().join("\n")
    }

    #[test]
    fn test_category_validation() {
        let model: Arc<dyn ModelBackend> = Arc::new(MockModel::new());
        assert!(matches!(
            Extractor::category("t", "q", Vec::<String>::new(), model.clone()),
            Err(TreeError::EmptyCategories { .. })
        ));
        assert!(matches!(
            Extractor::category("t", "q", ["a", "a"], model.clone()),
            Err(TreeError::DuplicateCategory { .. })
        ));
        assert!(matches!(
            Extractor::category("t", "q", ["a", "NA"], model.clone()),
            Err(TreeError::ReservedCategory { .. })
        ));
        assert!(matches!(
            Extractor::text("", "q", model),
            Err(TreeError::EmptyName)
        ));
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let result = Extractor::text("t", "q", Arc::new(MockModel::new()))
            .unwrap()
            .with_max_chunk_size(0);
        assert!(matches!(result, Err(TreeError::InvalidChunkSize { .. })));
    }

    #[test]
    fn test_classifier_only_backs_category_extractors() {
        let classifier = Arc::new(scripted(ModelDescription::classifier()));
        assert!(matches!(
            Extractor::numeric("n", "q", classifier.clone()),
            Err(TreeError::IncompatibleModel { kind: "numeric", .. })
        ));
        assert!(Extractor::category("c", "q", ["a"], classifier).is_ok());
    }

    #[test]
    fn test_category_majority_vote() {
        let model =
            scripted(ModelDescription::text()).with_answers(["lease", "lease", "employment"]);
        let extractor = Extractor::category(
            "doc_type",
            "Type?",
            ["lease", "employment"],
            Arc::new(model.clone()),
        )
        .unwrap()
        .with_max_chunk_size(10)
        .unwrap();

        assert_eq!(extractor.extract(&lines(3)), "lease");
        let calls = model.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].kind, CallKind::Batch);
        assert_eq!(calls[0].contexts.len(), 3);
        assert_eq!(calls[0].instruction.as_deref(), Some("Type?"));
    }

    #[test]
    fn test_category_scored_pick() {
        let model = scripted(ModelDescription::scored_text())
            .with_scored_answers([("lease", 0.2), ("lease", 0.9), ("employment", 0.5)]);
        let extractor = Extractor::category(
            "doc_type",
            "Type?",
            ["lease", "employment"],
            Arc::new(model.clone()),
        )
        .unwrap()
        .with_max_chunk_size(10)
        .unwrap();

        assert_eq!(extractor.extract(&lines(3)), "lease");
        assert_eq!(model.calls()[0].kind, CallKind::ScoredBatch);
    }

    #[test]
    fn test_category_scored_ignores_invalid_high_score() {
        let model = scripted(ModelDescription::scored_text())
            .with_scored_answers([("Lease", 0.99), ("other", 0.95), ("employment", 0.1)]);
        let extractor = Extractor::category(
            "doc_type",
            "Type?",
            ["lease", "employment"],
            Arc::new(model),
        )
        .unwrap()
        .with_max_chunk_size(10)
        .unwrap();

        assert_eq!(extractor.extract(&lines(3)), "employment");
    }

    #[test]
    fn test_classifier_receives_labels() {
        let model =
            scripted(ModelDescription::classifier()).with_scored_answers([("employment", 0.8)]);
        let extractor = Extractor::category(
            "doc_type",
            "Type?",
            ["lease", "employment"],
            Arc::new(model.clone()),
        )
        .unwrap();

        assert_eq!(extractor.extract("some contract"), "employment");
        let call = &model.calls()[0];
        assert!(call.instruction.is_none());
        assert_eq!(
            call.labels.as_deref(),
            Some(&["lease".to_string(), "employment".to_string()][..])
        );
    }

    #[test]
    fn test_category_prompt_sent() {
        let model = scripted(ModelDescription::text()).with_answers(["lease"]);
        let extractor =
            Extractor::category("doc_type", "Type?", ["lease"], Arc::new(model.clone())).unwrap();
        extractor.extract("x");
        let task = model.calls()[0].task_description.clone().unwrap();
        assert!(task.contains("\"lease\""));
    }

    #[test]
    fn test_numeric_votes_on_normalized_tokens() {
        let model = scripted(ModelDescription::text())
            .with_answers(["The rent is $1 190.99", "NA", "1 190.99 dollars", "1200"]);
        let extractor = Extractor::numeric("rent", "Monthly rent?", Arc::new(model))
            .unwrap()
            .with_max_chunk_size(10)
            .unwrap();

        assert_eq!(extractor.extract(&lines(4)), "1190.99");
    }

    #[test]
    fn test_numeric_scored_returns_normalized_token() {
        let model = scripted(ModelDescription::scored_text())
            .with_scored_answers([("no idea", 0.99), ("1.190,00 €", 0.7), ("12", 0.3)]);
        let extractor = Extractor::numeric("rent", "Monthly rent?", Arc::new(model))
            .unwrap()
            .with_max_chunk_size(10)
            .unwrap();

        assert_eq!(extractor.extract(&lines(3)), "1190");
    }

    #[test]
    fn test_text_takes_raw_answers() {
        let model = scripted(ModelDescription::text())
            .with_answers(["NA", "Jane Doe", "Jane Doe ", "Jane Doe"]);
        let extractor = Extractor::text("tenant", "Who is the tenant?", Arc::new(model))
            .unwrap()
            .with_max_chunk_size(10)
            .unwrap();

        assert_eq!(extractor.extract(&lines(4)), "Jane Doe");
    }

    #[test]
    fn test_text_scored_pick() {
        let model = scripted(ModelDescription::scored_text())
            .with_scored_answers([("Acme", 0.3), ("NA", 0.9), ("Globex", 0.6)]);
        let extractor = Extractor::text("employer", "Employer?", Arc::new(model))
            .unwrap()
            .with_max_chunk_size(10)
            .unwrap();

        assert_eq!(extractor.extract(&lines(3)), "Globex");
    }

    #[test]
    fn test_no_valid_answers_is_na_for_every_kind() {
        let doc = lines(3);
        let na = || scripted(ModelDescription::text()).with_answers(["NA", "nonsense", "NA"]);
        let scored_na =
            || scripted(ModelDescription::scored_text()).with_scored_answers([("NA", 0.5)]);

        let category = Extractor::category("c", "q", ["lease"], Arc::new(na())).unwrap();
        let numeric = Extractor::numeric("n", "q", Arc::new(na())).unwrap();
        let text_na = scripted(ModelDescription::text()).with_answers(["NA"]);
        let text = Extractor::text("t", "q", Arc::new(text_na)).unwrap();
        let scored = Extractor::numeric("s", "q", Arc::new(scored_na())).unwrap();

        assert_eq!(category.with_max_chunk_size(10).unwrap().extract(&doc), "NA");
        assert_eq!(numeric.with_max_chunk_size(10).unwrap().extract(&doc), "NA");
        assert_eq!(text.extract(&doc), "NA");
        assert_eq!(scored.extract(&doc), "NA");
    }

    #[test]
    fn test_failed_batch_call_is_na() {
        let model = scripted(ModelDescription::text()).with_answers(["lease"]).failing();
        let extractor =
            Extractor::category("doc_type", "Type?", ["lease"], Arc::new(model)).unwrap();
        assert_eq!(extractor.extract("lease"), "NA");

        let scored = scripted(ModelDescription::scored_text()).failing();
        let extractor = Extractor::text("t", "q", Arc::new(scored)).unwrap();
        assert_eq!(extractor.extract("anything"), "NA");
    }

    #[test]
    fn test_short_batch_is_padded_with_na() {
        let model = scripted(ModelDescription::text())
            .with_answers(["NA", "b", "b"])
            .truncating_batches_to(1);
        let extractor = Extractor::text("t", "q", Arc::new(model))
            .unwrap()
            .with_max_chunk_size(10)
            .unwrap();

        assert_eq!(extractor.extract(&lines(3)), "NA");
    }

    #[test]
    fn test_first_chunk_only_sends_one_chunk() {
        let model = scripted(ModelDescription::text()).with_answers(["lease"]);
        let extractor = Extractor::category("doc_type", "Type?", ["lease"], Arc::new(model.clone()))
            .unwrap()
            .with_max_chunk_size(10)
            .unwrap()
            .with_first_chunk_only(true);

        assert_eq!(extractor.extract(&lines(5)), "lease");
        assert_eq!(model.calls()[0].contexts, vec!["line 0".to_string()]);
    }

    #[test]
    fn test_extractor_is_reusable() {
        let extractor = Extractor::text("t", "q", Arc::new(MockModel::new())).unwrap();
        assert_eq!(extractor.extract("first"), "first");
        assert_eq!(extractor.extract("second"), "second");
    }
}
