//! Gatekeeper configuration

use crate::GatekeeperError;
use serde::{Deserialize, Serialize};

/// Configuration for validation rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Lowest accepted confidence (inclusive)
    pub min_confidence: f64,

    /// Highest accepted confidence (inclusive)
    pub max_confidence: f64,

    /// Maximum entity text length in characters
    pub max_entity_text_chars: usize,

    /// Maximum relationship evidence length in characters
    pub max_evidence_chars: usize,

    /// Reject entities whose type is outside the producing wave's taxonomy
    pub enforce_wave_taxonomy: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.7,
            max_confidence: 1.0,
            max_entity_text_chars: 256,
            max_evidence_chars: 1_000,
            enforce_wave_taxonomy: true,
        }
    }
}

impl ValidationConfig {
    /// Create a permissive configuration (accepts any confidence in [0, 1])
    pub fn permissive() -> Self {
        Self {
            min_confidence: 0.0,
            max_confidence: 1.0,
            max_entity_text_chars: 1_000,
            max_evidence_chars: 4_000,
            enforce_wave_taxonomy: true,
        }
    }

    /// Create a strict configuration (high confidence floor, short spans)
    pub fn strict() -> Self {
        Self {
            min_confidence: 0.85,
            max_confidence: 1.0,
            max_entity_text_chars: 128,
            max_evidence_chars: 500,
            enforce_wave_taxonomy: true,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), GatekeeperError> {
        for (field, value) in [
            ("min_confidence", self.min_confidence),
            ("max_confidence", self.max_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(GatekeeperError::ConfidenceOutOfRange { field, value });
            }
        }
        if self.min_confidence > self.max_confidence {
            return Err(GatekeeperError::InvertedBounds {
                min: self.min_confidence,
                max: self.max_confidence,
            });
        }
        if self.max_entity_text_chars == 0 {
            return Err(GatekeeperError::ZeroLimit("max_entity_text_chars"));
        }
        Ok(())
    }
}
