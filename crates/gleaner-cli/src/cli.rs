//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Gleaner CLI - Extract entities and relationships from documents.
#[derive(Debug, Parser)]
#[command(name = "gleaner")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true, env = "GLEANER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Built-in configuration preset (default, aggressive, lenient)
    #[arg(long, global = true, conflicts_with = "config")]
    pub preset: Option<String>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract entities and relationships from a document
    Extract(ExtractArgs),

    /// Show how a document would be routed, without calling the backend
    Route(RouteArgs),

    /// Print the effective configuration as TOML
    Config,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON (default)
    Json,
    /// Human-readable tables
    Table,
}

/// Arguments for the extract command.
#[derive(Debug, Parser)]
pub struct ExtractArgs {
    /// Document to process
    pub file: PathBuf,

    /// Force a strategy (single_pass, multi_wave, multi_wave_chunked, fallback_deep)
    #[arg(short, long)]
    pub strategy: Option<String>,

    /// Pattern library file (TOML); the built-in library is used otherwise
    #[arg(short, long)]
    pub patterns: Option<PathBuf>,

    /// Ollama endpoint
    #[arg(long, env = "GLEANER_ENDPOINT", default_value = gleaner_llm::ollama::DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Model name
    #[arg(short, long, env = "GLEANER_MODEL", default_value = "llama3")]
    pub model: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: OutputFormat,
}

/// Arguments for the route command.
#[derive(Debug, Parser)]
pub struct RouteArgs {
    /// Document to route
    pub file: PathBuf,

    /// Force a strategy
    #[arg(short, long)]
    pub strategy: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_extract() {
        let cli = Cli::try_parse_from([
            "gleaner",
            "extract",
            "contract.txt",
            "--strategy",
            "multi_wave",
            "--model",
            "mistral",
            "--verbose",
        ])
        .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Command::Extract(args) => {
                assert_eq!(args.file, PathBuf::from("contract.txt"));
                assert_eq!(args.strategy.as_deref(), Some("multi_wave"));
                assert_eq!(args.model, "mistral");
                assert_eq!(args.format, OutputFormat::Json);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_config_and_preset_conflict() {
        let result = Cli::try_parse_from([
            "gleaner", "--config", "a.toml", "--preset", "lenient", "config",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_route_requires_file() {
        assert!(Cli::try_parse_from(["gleaner", "route"]).is_err());
    }
}
