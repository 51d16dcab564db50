//! Route command implementation.

use super::{parse_strategy, read_document};
use crate::cli::RouteArgs;
use crate::error::Result;
use crate::output::Formatter;
use gleaner_extractor::{DocumentRouter, ExtractorConfig};
use std::sync::Arc;

/// Execute the route command.
///
/// Profiles the document and prints the routing decision. No backend is
/// contacted.
pub fn execute_route(args: RouteArgs, config: ExtractorConfig, formatter: &Formatter) -> Result<()> {
    let strategy = parse_strategy(args.strategy.as_deref())?;
    let document = read_document(&args.file)?;

    let router = DocumentRouter::new(Arc::new(config));
    let decision = router.route(&document, strategy)?;

    println!("{}", formatter.format_decision(&decision)?);
    Ok(())
}
