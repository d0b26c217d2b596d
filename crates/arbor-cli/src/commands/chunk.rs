//! Chunk command implementation.

use super::read_document;
use crate::cli::ChunkArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use arbor_extractor::TextChunker;
use std::io::Write;

/// Execute the chunk command.
pub fn execute_chunk(args: ChunkArgs, out: &mut impl Write) -> Result<()> {
    if args.max_chunk_size == 0 {
        return Err(CliError::InvalidInput(
            "max_chunk_size must be greater than 0".to_string(),
        ));
    }

    let text = read_document(&args.file)?;
    let chunks = TextChunker::new(args.max_chunk_size, args.first_chunk_only).chunk(&text);
    writeln!(out, "{}", Formatter::default().format_chunks(&chunks))?;
    Ok(())
}
