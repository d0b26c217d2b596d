//! Value types exchanged with model backends

use std::fmt;

/// The kind of answer a backend produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    /// Free-text completion driven by a natural-language instruction
    Text,
    /// Multi-label classifier that scores a list of candidate labels
    Classifier,
}

impl ModelKind {
    /// Stable lowercase name ("text" or "classifier")
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Text => "text",
            ModelKind::Classifier => "classifier",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared call shape of a backend
///
/// The extraction core reads this before issuing any request: `kind` decides
/// what query is sent, `scores` decides between scored and unscored batch calls
/// and therefore between best-score and majority-vote consensus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelDescription {
    /// Answer kind
    pub kind: ModelKind,
    /// Whether the backend returns a confidence score with each answer
    pub scores: bool,
}

impl ModelDescription {
    /// Text backend without scores
    pub const fn text() -> Self {
        Self {
            kind: ModelKind::Text,
            scores: false,
        }
    }

    /// Text backend returning scores
    pub const fn scored_text() -> Self {
        Self {
            kind: ModelKind::Text,
            scores: true,
        }
    }

    /// Classifier backend returning scores
    pub const fn classifier() -> Self {
        Self {
            kind: ModelKind::Classifier,
            scores: true,
        }
    }
}

/// What the backend is asked
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Query<'a> {
    /// Natural-language task instruction
    Instruction(&'a str),
    /// Candidate labels for a classifier backend
    Labels(&'a [String]),
}

impl Query<'_> {
    /// Render the query as prompt text
    ///
    /// Labels are joined with ", " so text backends can still use them.
    pub fn to_prompt_text(&self) -> String {
        match self {
            Query::Instruction(text) => (*text).to_string(),
            Query::Labels(labels) => labels.join(", "),
        }
    }
}

/// Optional prompt framing passed along with the query
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Instructions<'a> {
    /// Text placed between the query and the context
    pub task_description: Option<&'a str>,
    /// System prompt for chat-style backends
    pub system_prompt: Option<&'a str>,
}

impl<'a> Instructions<'a> {
    /// Framing with both a task description and a system prompt
    pub fn new(task_description: &'a str, system_prompt: &'a str) -> Self {
        Self {
            task_description: Some(task_description),
            system_prompt: Some(system_prompt),
        }
    }
}

/// One answer together with the backend's confidence in it
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredAnswer {
    /// Raw answer text
    pub answer: String,
    /// Confidence score; higher is better
    pub score: f64,
}

impl ScoredAnswer {
    /// Create a scored answer
    pub fn new(answer: impl Into<String>, score: f64) -> Self {
        Self {
            answer: answer.into(),
            score,
        }
    }

    /// The `NA` sentinel with the lowest possible score
    pub fn na() -> Self {
        Self::new(crate::NA, f64::NEG_INFINITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_render_as_comma_list() {
        let labels = vec!["lease".to_string(), "employment".to_string()];
        assert_eq!(Query::Labels(&labels).to_prompt_text(), "lease, employment");
        assert_eq!(Query::Instruction("What?").to_prompt_text(), "What?");
    }

    #[test]
    fn test_description_presets() {
        assert_eq!(ModelDescription::text().kind, ModelKind::Text);
        assert!(!ModelDescription::text().scores);
        assert!(ModelDescription::scored_text().scores);
        assert_eq!(ModelDescription::classifier().kind, ModelKind::Classifier);
    }

    #[test]
    fn test_na_answer_never_outscores() {
        let na = ScoredAnswer::na();
        assert_eq!(na.answer, "NA");
        assert!(na.score < -1e300);
    }
}
