//! Arbor CLI library.
//!
//! This library provides the core functionality for the `arbor` command-line
//! interface: loading tree definitions and model tables, running extraction
//! over documents, and formatting the results.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

pub use cli::{Cli, Command};
pub use config::{ArborConfig, ModelConfig};
pub use error::{CliError, Result};
pub use output::Formatter;
