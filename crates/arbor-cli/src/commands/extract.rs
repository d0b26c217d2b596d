//! Extract command implementation.

use super::read_document;
use crate::cli::ExtractArgs;
use crate::config::ArborConfig;
use crate::error::Result;
use crate::output::Formatter;
use std::io::Write;
use tracing::info;

/// Execute the extract command.
pub fn execute_extract(args: ExtractArgs, out: &mut impl Write) -> Result<()> {
    let config = ArborConfig::load(&args.config)?;
    let tree = config.build_tree()?;
    info!(
        "Loaded tree with {} extractors from {}",
        tree.names().len(),
        args.config.display()
    );

    // Read everything up front so a missing file fails before any model call
    let documents = args
        .files
        .iter()
        .map(|path| read_document(path))
        .collect::<Result<Vec<_>>>()?;
    let texts: Vec<&str> = documents.iter().map(String::as_str).collect();

    let formatter = Formatter::new(args.compact);
    for (path, results) in args.files.iter().zip(tree.extract_many(&texts)) {
        writeln!(out, "{}", formatter.format_document(path, &results)?)?;
    }

    Ok(())
}
