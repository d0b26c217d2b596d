//! Validate command implementation.

use crate::cli::ValidateArgs;
use crate::config::ArborConfig;
use crate::error::Result;
use std::io::Write;

/// Execute the validate command.
pub fn execute_validate(args: ValidateArgs, out: &mut impl Write) -> Result<()> {
    let config = ArborConfig::load(&args.config)?;
    let tree = config.build_tree()?;

    let names = tree.names();
    writeln!(out, "Tree is valid: {} extractor(s)", names.len())?;
    for name in names {
        writeln!(out, "  {}", name)?;
    }
    Ok(())
}
