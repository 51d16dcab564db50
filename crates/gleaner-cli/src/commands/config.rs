//! Config command implementation.

use crate::error::Result;
use gleaner_extractor::ExtractorConfig;

/// Print the effective configuration as TOML.
pub fn execute_config(config: &ExtractorConfig) -> Result<()> {
    print!("{}", config.to_toml()?);
    Ok(())
}
