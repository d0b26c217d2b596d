//! Arbor Extractor
//!
//! Extracts structured attributes from unstructured documents by routing the
//! text through a tree of model-backed extraction steps.
//!
//! # Overview
//!
//! Every step is an [`Extractor`]: one query bound to one model backend. The
//! extractor splits the document into newline-aligned chunks, asks the model
//! about every chunk in a single batch call, and collapses the per-chunk
//! answers into one value. Category extractors gate the rest of the tree: the
//! label they produce selects which child [`Node`]s run next.
//!
//! # Architecture
//!
//! ```text
//! Document → Node → Extractor → Chunker → ModelBackend → Normalizer → Consensus
//!              ↓ (category value selects a branch)
//!            child Nodes → ... → ResultMap
//! ```
//!
//! # Key Features
//!
//! - **Chunking**: greedy newline-aligned merging under a size bound
//! - **Consensus**: best-score pick for scored backends, majority vote otherwise
//! - **Numeric normalization**: locale-ambiguous separators resolved to one number
//! - **Fail-fast trees**: structural errors surface at construction
//! - **`NA` sentinel**: missing answers never abort an extraction
//!
//! # Example Usage
//!
//! ```
//! use arbor_extractor::{Extractor, Node};
//! use arbor_llm::MockModel;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), arbor_extractor::TreeError> {
//! let model = Arc::new(MockModel::new());
//!
//! let doc_type = Extractor::category(
//!     "doc_type",
//!     "What kind of contract is this?",
//!     ["lease", "employment"],
//!     model.clone(),
//! )?
//! .with_first_chunk_only(true);
//! let tenant = Extractor::text("tenant", "Who is the tenant?", model)?;
//!
//! let tree = Node::new(doc_type, [("lease", vec![Node::leaf(tenant)])])?;
//!
//! let results = tree.extract("lease");
//! assert_eq!(results.get("doc_type"), Some("lease"));
//! assert_eq!(results.get("tenant"), Some("lease"));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod chunking;
mod config;
mod consensus;
mod error;
mod extractor;
mod node;
mod normalize;
mod prompt;
mod types;


pub use chunking::TextChunker;
pub use config::{ExtractorDefaults, ExtractorKindConfig, ModelTable, NodeConfig, TreeConfig};
pub use consensus::{majority_vote, pick_by_score, resolve, ChunkAnswers};
pub use error::{ConfigError, TreeError};
pub use extractor::{Extractor, ExtractorKind, DEFAULT_MAX_CHUNK_SIZE};
pub use node::Node;
pub use normalize::{format_number, normalize_numeric, parse_number};
pub use types::ResultMap;
