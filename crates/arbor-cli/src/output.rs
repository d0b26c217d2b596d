//! Output formatting for the CLI.

use crate::error::Result;
use arbor_extractor::ResultMap;
use serde::Serialize;
use std::path::Path;

/// One document's extraction result, as printed by `extract`.
#[derive(Debug, Serialize)]
pub struct DocumentResult<'a> {
    /// Document path as given on the command line
    pub document: String,
    /// Extracted values in traversal order
    pub result: &'a ResultMap,
}

/// Output formatter.
#[derive(Debug, Clone, Copy, Default)]
pub struct Formatter {
    compact: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(compact: bool) -> Self {
        Self { compact }
    }

    /// Format one document's results as JSON.
    pub fn format_document(&self, path: &Path, result: &ResultMap) -> Result<String> {
        let document = DocumentResult {
            document: path.display().to_string(),
            result,
        };
        let json = if self.compact {
            serde_json::to_string(&document)?
        } else {
            serde_json::to_string_pretty(&document)?
        };
        Ok(json)
    }

    /// Format chunks with a header line before each.
    pub fn format_chunks(&self, chunks: &[String]) -> String {
        chunks
            .iter()
            .enumerate()
            .map(|(i, chunk)| {
                format!(
                    "--- chunk {} of {} ({} chars) ---\n{}",
                    i + 1,
                    chunks.len(),
                    chunk.chars().count(),
                    chunk
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
