//! Newline-aligned text chunking

/// Splits document text into bounded, newline-aligned chunks
///
/// Lines are merged greedily: a line joins the current chunk while the merged
/// length stays strictly below `max_chunk_size - 1` characters (the joining
/// newline included). Lines are never split, so a single line longer than the
/// bound becomes its own oversized chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextChunker {
    max_chunk_size: usize,
    first_chunk_only: bool,
}

impl TextChunker {
    /// Create a new text chunker
    pub fn new(max_chunk_size: usize, first_chunk_only: bool) -> Self {
        Self {
            max_chunk_size,
            first_chunk_only,
        }
    }

    /// Chunk the given text
    ///
    /// Always returns at least one chunk; empty text yields one empty chunk.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        // Merged length must stay below this many characters
        let limit = self.max_chunk_size.saturating_sub(1);

        let mut chunks = Vec::new();
        let mut current: Option<(String, usize)> = None;

        for line in text.split('\n') {
            let line_len = line.chars().count();
            current = match current.take() {
                Some((mut chunk, len)) if len + line_len < limit => {
                    chunk.push('\n');
                    chunk.push_str(line);
                    Some((chunk, len + 1 + line_len))
                }
                Some((chunk, _)) => {
                    chunks.push(chunk);
                    if self.first_chunk_only {
                        return chunks;
                    }
                    Some((line.to_string(), line_len))
                }
                None => Some((line.to_string(), line_len)),
            };
        }

        if let Some((chunk, _)) = current {
            chunks.push(chunk);
        }
        chunks
    }
}
