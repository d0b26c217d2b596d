//! Arbor CLI - Run extraction trees over documents.

use arbor_cli::commands;
use arbor_cli::{Cli, Command};
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Log to stderr so stdout stays machine-readable.
///
/// `-v` flags take precedence over `RUST_LOG`; without either only warnings
/// are shown.
fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

fn run(cli: Cli) -> arbor_cli::Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Command::Extract(args) => commands::execute_extract(args, &mut out)?,
        Command::Validate(args) => commands::execute_validate(args, &mut out)?,
        Command::Chunk(args) => commands::execute_chunk(args, &mut out)?,
        Command::Normalize(args) => commands::execute_normalize(args, &mut out)?,
    }

    Ok(())
}
