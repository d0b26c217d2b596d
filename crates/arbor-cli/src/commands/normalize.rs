//! Normalize command implementation.

use crate::cli::NormalizeArgs;
use crate::error::Result;
use arbor_domain::NA;
use arbor_extractor::normalize_numeric;
use std::io::Write;

/// Execute the normalize command.
///
/// Prints one line per input: the normalized token, or `NA`.
pub fn execute_normalize(args: NormalizeArgs, out: &mut impl Write) -> Result<()> {
    for text in &args.text {
        let token = normalize_numeric(text).unwrap_or_else(|| NA.to_string());
        writeln!(out, "{}", token)?;
    }
    Ok(())
}
