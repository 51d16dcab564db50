//! Error types for the CLI application.

use gleaner_extractor::ExtractorError;
use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Routing, configuration or extraction error
    #[error(transparent)]
    Extraction(#[from] ExtractorError),

    /// Backend could not be set up
    #[error("Backend error: {0}")]
    Backend(#[from] gleaner_llm::LlmError),

    /// Pattern library could not be loaded
    #[error("Pattern library error: {0}")]
    Patterns(#[from] gleaner_patterns::PatternError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Setup task failed
    #[error("Setup failed: {0}")]
    Setup(String),

    /// Strategy name not recognised
    #[error("Unknown strategy '{0}' (expected single_pass, multi_wave, multi_wave_chunked or fallback_deep)")]
    UnknownStrategy(String),

    /// Preset name not recognised
    #[error("Unknown preset '{0}' (expected default, aggressive or lenient)")]
    UnknownPreset(String),
}

impl CliError {
    /// Process exit code for this error
    ///
    /// 1: infeasible or unknown strategy, 2: nothing could be extracted,
    /// 3: configuration, I/O or setup problems.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Extraction(ExtractorError::InvalidOverride { .. })
            | CliError::UnknownStrategy(_) => 1,
            CliError::Extraction(ExtractorError::DocumentFailure { .. }) => 2,
            _ => 3,
        }
    }
}
