//! CLI command definitions and argument parsing.

use arbor_extractor::DEFAULT_MAX_CHUNK_SIZE;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Arbor - Extract structured attributes from documents with an extraction tree.
#[derive(Debug, Parser)]
#[command(name = "arbor")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the extraction tree over one or more documents
    Extract(ExtractArgs),

    /// Build the extraction tree and report any construction error
    Validate(ValidateArgs),

    /// Show how a document would be chunked
    Chunk(ChunkArgs),

    /// Normalize numeric answers the way numeric extractors do
    Normalize(NormalizeArgs),
}

/// Arguments for the extract command.
#[derive(Debug, Parser)]
pub struct ExtractArgs {
    /// Tree definition (TOML)
    #[arg(short, long, env = "ARBOR_CONFIG")]
    pub config: PathBuf,

    /// Documents to extract from
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Print one JSON object per line
    #[arg(long)]
    pub compact: bool,
}

/// Arguments for the validate command.
#[derive(Debug, Parser)]
pub struct ValidateArgs {
    /// Tree definition (TOML)
    #[arg(short, long, env = "ARBOR_CONFIG")]
    pub config: PathBuf,
}

/// Arguments for the chunk command.
#[derive(Debug, Parser)]
pub struct ChunkArgs {
    /// Maximum chunk size (characters)
    #[arg(short, long, default_value_t = DEFAULT_MAX_CHUNK_SIZE)]
    pub max_chunk_size: usize,

    /// Keep only the first chunk
    #[arg(long)]
    pub first_chunk_only: bool,

    /// Document to chunk
    pub file: PathBuf,
}

/// Arguments for the normalize command.
#[derive(Debug, Parser)]
pub struct NormalizeArgs {
    /// Raw answers to normalize
    #[arg(required = true)]
    pub text: Vec<String>,
}
