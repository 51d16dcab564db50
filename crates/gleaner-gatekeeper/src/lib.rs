//! Gleaner Gatekeeper
//!
//! Validates candidate entities and relationships before reconciliation.
//!
//! The Gatekeeper checks:
//! - Entity type membership in the producing wave's taxonomy
//! - Text length (non-empty, bounded)
//! - Confidence bounds
//! - Evidence length for relationships
//! - Relationship endpoints scoped to earlier waves of the same chunk
//! - Relationship endpoint resolution (reported by the reconciler)
//!
//! # Examples
//!
//! ```
//! use gleaner_gatekeeper::{Gatekeeper, ValidationConfig, ValidationStatus};
//! use gleaner_domain::{CandidateEntity, ChunkId, EntityRef, EntityType};
//!
//! let gatekeeper = Gatekeeper::new(ValidationConfig::default());
//! let entity = CandidateEntity {
//!     id: EntityRef::new(ChunkId(0), 1, 0),
//!     entity_type: EntityType::Person,
//!     text: "Ada Lovelace".to_string(),
//!     start_pos: None,
//!     end_pos: None,
//!     confidence: 0.92,
//!     source_wave: 1,
//!     source_chunk: ChunkId(0),
//! };
//! let result = gatekeeper.validate_entity(&entity, &[EntityType::Person]);
//! assert_eq!(result.status, ValidationStatus::Accepted);
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod validator;

pub use config::ValidationConfig;
pub use error::GatekeeperError;
pub use validator::{Gatekeeper, RejectionReason, ValidationResult, ValidationStatus};
