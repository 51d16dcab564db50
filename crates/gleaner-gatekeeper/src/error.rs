//! Gatekeeper error types

use thiserror::Error;

/// Rejected validation settings
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatekeeperError {
    /// A confidence bound lies outside `[0.0, 1.0]`
    #[error("{field} must lie within [0.0, 1.0], got {value}")]
    ConfidenceOutOfRange {
        /// Offending setting
        field: &'static str,
        /// Configured value
        value: f64,
    },

    /// The confidence floor is above the ceiling
    #[error("min_confidence {min} exceeds max_confidence {max}")]
    InvertedBounds {
        /// Configured floor
        min: f64,
        /// Configured ceiling
        max: f64,
    },

    /// A length limit of zero
    #[error("{0} must be greater than 0")]
    ZeroLimit(&'static str),
}
