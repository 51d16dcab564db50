//! Extract command implementation.

use super::{parse_strategy, read_document};
use crate::cli::ExtractArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use gleaner_extractor::{ExtractionPipeline, ExtractorConfig};
use gleaner_llm::OllamaProvider;
use gleaner_patterns::PatternLibrary;
use tracing::info;

/// Execute the extract command.
pub async fn execute_extract(
    args: ExtractArgs,
    config: ExtractorConfig,
    formatter: &Formatter,
) -> Result<()> {
    let strategy = parse_strategy(args.strategy.as_deref())?;
    let document = read_document(&args.file)?;

    let patterns = match &args.patterns {
        Some(path) => PatternLibrary::from_file(path)?,
        None => PatternLibrary::builtin(),
    };

    // The blocking HTTP client is built off the async workers. Its timeout
    // stays above the unit timeout the orchestrator enforces.
    let (endpoint, model) = (args.endpoint.clone(), args.model.clone());
    let http_timeout = config.orchestrator.unit_timeout() * 2;
    let backend = tokio::task::spawn_blocking(move || {
        OllamaProvider::with_timeout(endpoint, model, http_timeout)
    })
    .await
    .map_err(|e| CliError::Setup(e.to_string()))??;
    info!(
        "Extracting {} with model {} at {}",
        args.file.display(),
        args.model,
        args.endpoint
    );

    let pipeline = ExtractionPipeline::new(backend, patterns, config)?;
    let result = pipeline.extract(&document, strategy).await?;

    println!("{}", formatter.format_result(&result)?);
    if let Some(notice) = formatter.degraded_notice(result.processing_stats()) {
        eprintln!("{}", notice);
    }
    Ok(())
}
