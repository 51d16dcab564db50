//! Error types for the Extractor

use gleaner_domain::{FailureKind, Strategy};
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced to the caller of the pipeline
///
/// Everything that can go wrong inside a single (chunk, wave) unit is a
/// [`UnitError`] instead and ends up in the processing stats.
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// The requested strategy cannot process this document
    #[error("Invalid strategy override '{requested}': {reason}")]
    InvalidOverride {
        /// Strategy the caller asked for
        requested: Strategy,
        /// Why it was refused
        reason: String,
    },

    /// No entity wave completed on any chunk
    #[error("Document failure: {failed_units} units failed, no entity wave completed across {chunks} chunks")]
    DocumentFailure {
        /// Failed or cancelled units
        failed_units: usize,
        /// Chunks in the plan
        chunks: usize,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Chunking parameters were rejected
    #[error("Chunking error: {0}")]
    Chunking(#[from] ChunkError),
}

/// Invalid parameters for the chunk engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChunkError {
    /// Target size of zero
    #[error("target_size must be greater than 0")]
    ZeroTarget,

    /// Overlap would stop the scan from advancing
    #[error("overlap_size ({overlap}) must be smaller than target_size ({target})")]
    OverlapTooLarge {
        /// Requested overlap
        overlap: usize,
        /// Requested target
        target: usize,
    },

    /// Minimum larger than the target
    #[error("min_size ({min}) cannot exceed target_size ({target})")]
    MinTooLarge {
        /// Requested minimum
        min: usize,
        /// Requested target
        target: usize,
    },
}

/// Failure of a single (chunk, wave) unit
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UnitError {
    /// Composed prompt does not fit the context budget
    #[error("Prompt overflow: ~{estimated} tokens (budget: {budget})")]
    PromptOverflow {
        /// Estimated prompt tokens
        estimated: usize,
        /// Tokens available for the prompt
        budget: usize,
    },

    /// Completion backend error
    #[error("Backend error: {0}")]
    Backend(String),

    /// Backend did not answer in time
    #[error("Unit timed out after {0:?}")]
    Timeout(Duration),

    /// Response did not match the output schema
    #[error("Schema violation: {0}")]
    SchemaViolation(String),

    /// Document was cancelled before the unit completed
    #[error("Cancelled")]
    Cancelled,
}

impl UnitError {
    /// Failure category recorded in the stats
    pub fn kind(&self) -> FailureKind {
        match self {
            UnitError::PromptOverflow { .. } => FailureKind::PromptOverflow,
            UnitError::Backend(_) => FailureKind::Backend,
            UnitError::Timeout(_) => FailureKind::Timeout,
            UnitError::SchemaViolation(_) => FailureKind::SchemaViolation,
            UnitError::Cancelled => FailureKind::Cancelled,
        }
    }

    /// Whether the retry policy applies
    pub fn is_retryable(&self) -> bool {
        matches!(self, UnitError::Backend(_) | UnitError::Timeout(_))
    }
}

impl From<serde_json::Error> for UnitError {
    fn from(e: serde_json::Error) -> Self {
        UnitError::SchemaViolation(format!("JSON parse error: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(UnitError::Backend("down".to_string()).is_retryable());
        assert!(UnitError::Timeout(Duration::from_secs(1)).is_retryable());
        assert!(!UnitError::SchemaViolation("bad".to_string()).is_retryable());
        assert!(!UnitError::PromptOverflow { estimated: 10, budget: 5 }.is_retryable());
        assert!(!UnitError::Cancelled.is_retryable());
    }

    #[test]
    fn test_unit_error_kinds() {
        assert_eq!(UnitError::Cancelled.kind(), FailureKind::Cancelled);
        assert_eq!(UnitError::Backend(String::new()).kind(), FailureKind::Backend);
    }

    #[test]
    fn test_invalid_override_message() {
        let err = ExtractorError::InvalidOverride {
            requested: Strategy::SinglePass,
            reason: "too large".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid strategy override 'single_pass': too large"
        );
    }
}
