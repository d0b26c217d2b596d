//! Command implementations.

pub mod chunk;
pub mod extract;
pub mod normalize;
pub mod validate;

pub use self::chunk::execute_chunk;
pub use self::extract::execute_extract;
pub use self::normalize::execute_normalize;
pub use self::validate::execute_validate;

use crate::error::{CliError, Result};
use std::fs;
use std::path::Path;

/// Read a document, naming the file on failure.
pub(crate) fn read_document(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| CliError::ReadFile {
        path: path.to_path_buf(),
        source,
    })
}
