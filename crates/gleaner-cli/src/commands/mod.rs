//! Command implementations.

pub mod config;
pub mod extract;
pub mod route;

pub use self::config::execute_config;
pub use self::extract::execute_extract;
pub use self::route::execute_route;

use crate::error::{CliError, Result};
use gleaner_domain::{Document, Strategy};
use std::path::Path;

/// Parse an optional strategy name given on the command line.
pub(crate) fn parse_strategy(name: Option<&str>) -> Result<Option<Strategy>> {
    name.map(|n| Strategy::parse(n).ok_or_else(|| CliError::UnknownStrategy(n.to_string())))
        .transpose()
}

/// Read a document from disk, recording its path as the `source` metadata.
pub(crate) fn read_document(path: &Path) -> Result<Document> {
    let text = std::fs::read_to_string(path)?;
    Ok(Document::new(text).with_metadata("source", path.display().to_string()))
}
