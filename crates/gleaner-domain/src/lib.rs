//! Gleaner Domain Layer
//!
//! Core value types and collaborator traits for the extraction pipeline.
//! This crate performs no I/O and depends only on `uuid`; everything that talks
//! to a model backend or a pattern store lives in other crates behind the
//! traits defined in [`traits`].
//!
//! ## Key Concepts
//!
//! - **Document**: immutable input text plus metadata
//! - **Routing decision**: the strategy (and optional chunk plan) chosen for a document
//! - **Wave**: one ordered extraction stage targeting a subset of the taxonomy
//! - **Raw wave result**: what one (chunk, wave) unit produced
//! - **Reconciled result**: the deduplicated, confidence-ranked final output

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod chunk;
pub mod document;
pub mod entity;
pub mod result;
pub mod routing;
pub mod stats;
pub mod taxonomy;
pub mod traits;
pub mod wave;

// Re-exports for convenience
pub use chunk::{Chunk, ChunkId};
pub use document::{Document, DocumentId};
pub use entity::{
    CandidateEntity, CandidateRelationship, EntityKey, EntityRef, RawWaveResult, TokenUsage,
};
pub use result::{ReconciledEntity, ReconciledRelationship, ReconciledResult};
pub use routing::{ChunkPlan, RoutingDecision, RoutingRationale, SizeCategory, SizeProfile, Strategy};
pub use stats::{FailureKind, ProcessingStats, UnitFailure};
pub use taxonomy::{EntityType, RelationshipType};
pub use wave::{Wave, WaveKind};
