//! Gleaner CLI library.
//!
//! Argument parsing, configuration loading, command execution and output
//! formatting for the `gleaner` binary.

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;
pub mod settings;

pub use cli::{Cli, Command, OutputFormat};
pub use error::{CliError, Result};
pub use output::Formatter;
