//! Gleaner CLI - Extract entities and relationships from documents.

use clap::Parser;
use gleaner_cli::commands;
use gleaner_cli::{settings, Cli, Command, Formatter, OutputFormat};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the result
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let color_enabled = !cli.no_color;
    if let Err(e) = run(cli).await {
        let formatter = Formatter::new(OutputFormat::Json, color_enabled);
        eprintln!("{}", formatter.error(&e.to_string()));
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> gleaner_cli::Result<()> {
    let config = settings::load_config(cli.config.as_deref(), cli.preset.as_deref())?;
    let color_enabled = !cli.no_color;

    match cli.command {
        Command::Extract(args) => {
            let formatter = Formatter::new(args.format, color_enabled);
            commands::execute_extract(args, config, &formatter).await
        }
        Command::Route(args) => {
            let formatter = Formatter::new(OutputFormat::Json, color_enabled);
            commands::execute_route(args, config, &formatter)
        }
        Command::Config => commands::execute_config(&config),
    }
}
