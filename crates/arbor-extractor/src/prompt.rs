//! Prompt framing sent with each extractor's query

use arbor_domain::Instructions;

const CATEGORY_SYSTEM_PROMPT: &str = "You classify documents. Answer with exactly one of the \
valid categories and nothing else. If the text below holds no relevant information, answer \"NA\". \
Do not guess.";

const NUMERIC_TASK: &str = "Use the information given below.";

const NUMERIC_SYSTEM_PROMPT: &str = "You extract a single numerical value from a document. \
Answer with the number only, without explanation or context. If the text below holds no \
relevant information, answer \"NA\". Do not guess.";

const TEXT_TASK: &str = "Use the information given below.";

const TEXT_SYSTEM_PROMPT: &str = "You extract a text snippet from a document. Answer with the \
relevant snippet only, without explanation or context. If the text below holds no relevant \
information, answer \"NA\". Do not guess.";

/// Task description and system prompt for one extractor
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PromptTemplate {
    task_description: String,
    system_prompt: &'static str,
}

impl PromptTemplate {
    /// Framing for a category extractor; lists the valid categories
    pub fn category(categories: &[String]) -> Self {
        let quoted: Vec<String> = categories.iter().map(|c| format!("\"{}\"", c)).collect();
        Self {
            task_description: format!(
                "Valid categories are: {}.\nUse the information below:",
                quoted.join(", ")
            ),
            system_prompt: CATEGORY_SYSTEM_PROMPT,
        }
    }

    /// Framing for a numeric extractor
    pub fn numeric() -> Self {
        Self {
            task_description: NUMERIC_TASK.to_string(),
            system_prompt: NUMERIC_SYSTEM_PROMPT,
        }
    }

    /// Framing for a free-text extractor
    pub fn text() -> Self {
        Self {
            task_description: TEXT_TASK.to_string(),
            system_prompt: TEXT_SYSTEM_PROMPT,
        }
    }

    /// Borrow as backend instructions
    pub fn instructions(&self) -> Instructions<'_> {
        Instructions::new(&self.task_description, self.system_prompt)
    }
}
