//! Candidate validation logic

use crate::ValidationConfig;
use gleaner_domain::{CandidateEntity, CandidateRelationship, EntityRef, EntityType};

/// Result of candidate validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    /// Whether the candidate passed validation
    pub status: ValidationStatus,

    /// Rejection reasons (empty when accepted)
    pub reasons: Vec<RejectionReason>,
}

impl ValidationResult {
    fn from_reasons(reasons: Vec<RejectionReason>) -> Self {
        let status = if reasons.is_empty() {
            ValidationStatus::Accepted
        } else {
            ValidationStatus::Rejected
        };
        Self { status, reasons }
    }

    /// True if the candidate was accepted
    pub fn is_accepted(&self) -> bool {
        self.status == ValidationStatus::Accepted
    }
}

/// Validation status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationStatus {
    /// Candidate accepted
    Accepted,

    /// Candidate rejected
    Rejected,
}

/// Reasons for rejection
#[derive(Debug, Clone, PartialEq)]
pub enum RejectionReason {
    /// Entity type is not in the producing wave's taxonomy
    TypeOutsideTaxonomy {
        /// Offending type
        entity_type: EntityType,
        /// Wave that produced it
        wave: u8,
    },

    /// Entity text is empty after trimming
    EmptyText,

    /// Entity text exceeds the configured maximum
    TextTooLong {
        /// Actual length in characters
        length: usize,
        /// Configured maximum
        max: usize,
    },

    /// Confidence outside the configured bounds (or not a number)
    ConfidenceOutOfBounds {
        /// Reported confidence
        value: f64,
        /// Lower bound
        min: f64,
        /// Upper bound
        max: f64,
    },

    /// Relationship evidence exceeds the configured maximum
    EvidenceTooLong {
        /// Actual length in characters
        length: usize,
        /// Configured maximum
        max: usize,
    },

    /// Relationship endpoint does not name a surviving entity
    UnresolvedReference(EntityRef),

    /// Relationship endpoint names an entity from another chunk or a later wave
    ReferenceOutOfScope(EntityRef),
}

/// The Gatekeeper validates candidates before reconciliation
#[derive(Debug, Clone)]
pub struct Gatekeeper {
    config: ValidationConfig,
}

impl Gatekeeper {
    /// Create a new Gatekeeper with the given configuration
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Create a Gatekeeper with default configuration
    pub fn default_config() -> Self {
        Self::new(ValidationConfig::default())
    }

    /// Active configuration
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Validate an entity against the producing wave's taxonomy and the configured bounds
    pub fn validate_entity(&self, entity: &CandidateEntity, taxonomy: &[EntityType]) -> ValidationResult {
        let mut reasons = Vec::new();

        if self.config.enforce_wave_taxonomy && !taxonomy.contains(&entity.entity_type) {
            reasons.push(RejectionReason::TypeOutsideTaxonomy {
                entity_type: entity.entity_type,
                wave: entity.source_wave,
            });
        }

        if let Some(reason) = self.check_text(&entity.text) {
            reasons.push(reason);
        }

        if let Some(reason) = self.check_confidence(entity.confidence) {
            reasons.push(reason);
        }

        ValidationResult::from_reasons(reasons)
    }

    /// Validate a relationship's confidence and evidence
    ///
    /// Endpoint resolution needs the set of surviving entities and is
    /// checked by the caller; see [`RejectionReason::UnresolvedReference`].
    pub fn validate_relationship(&self, relationship: &CandidateRelationship) -> ValidationResult {
        let mut reasons = Vec::new();

        if let Some(reason) = self.check_confidence(relationship.confidence) {
            reasons.push(reason);
        }

        // Endpoints must come from an earlier wave on the same chunk
        for endpoint in [relationship.source_entity_ref, relationship.target_entity_ref] {
            if endpoint.chunk != relationship.source_chunk || endpoint.wave >= relationship.source_wave {
                reasons.push(RejectionReason::ReferenceOutOfScope(endpoint));
            }
        }

        let length = relationship.evidence_text.chars().count();
        if length > self.config.max_evidence_chars {
            reasons.push(RejectionReason::EvidenceTooLong {
                length,
                max: self.config.max_evidence_chars,
            });
        }

        ValidationResult::from_reasons(reasons)
    }

    fn check_text(&self, text: &str) -> Option<RejectionReason> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Some(RejectionReason::EmptyText);
        }

        let length = trimmed.chars().count();
        if length > self.config.max_entity_text_chars {
            return Some(RejectionReason::TextTooLong {
                length,
                max: self.config.max_entity_text_chars,
            });
        }

        None
    }

    fn check_confidence(&self, value: f64) -> Option<RejectionReason> {
        // NaN fails the range check
        if (self.config.min_confidence..=self.config.max_confidence).contains(&value) {
            None
        } else {
            Some(RejectionReason::ConfidenceOutOfBounds {
                value,
                min: self.config.min_confidence,
                max: self.config.max_confidence,
            })
        }
    }
}
