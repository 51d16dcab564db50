//! Candidate entities and relationships produced by a single wave

use crate::chunk::ChunkId;
use crate::taxonomy::{EntityType, RelationshipType};
use std::fmt;

/// Stable reference to a candidate entity: `c{chunk}.w{wave}.e{index}`
///
/// Assigned when a wave response is parsed. Dependent waves see these
/// references in their prompt and use them to name relationship endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityRef {
    /// Chunk the entity was found in
    pub chunk: ChunkId,
    /// Ordinal of the wave that produced it
    pub wave: u8,
    /// Index within that wave's entity list
    pub index: u32,
}

impl EntityRef {
    /// Create a reference
    pub fn new(chunk: ChunkId, wave: u8, index: u32) -> Self {
        Self { chunk, wave, index }
    }

    /// Parse the `c{chunk}.w{wave}.e{index}` form
    ///
    /// # Examples
    ///
    /// ```
    /// use gleaner_domain::{ChunkId, EntityRef};
    ///
    /// let r = EntityRef::parse("c2.w1.e14").unwrap();
    /// assert_eq!(r, EntityRef::new(ChunkId(2), 1, 14));
    /// assert!(EntityRef::parse("E14").is_none());
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.trim().split('.');
        let chunk = parts.next()?.strip_prefix('c')?.parse().ok()?;
        let wave = parts.next()?.strip_prefix('w')?.parse().ok()?;
        let index = parts.next()?.strip_prefix('e')?.parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self::new(ChunkId(chunk), wave, index))
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}.w{}.e{}", self.chunk.0, self.wave, self.index)
    }
}

/// Deduplication key: normalized text plus entity type
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityKey {
    /// Lower-cased, trimmed entity text
    pub normalized_text: String,
    /// Entity type
    pub entity_type: EntityType,
}

impl EntityKey {
    /// Build the key for a text and type
    pub fn new(text: &str, entity_type: EntityType) -> Self {
        Self {
            normalized_text: Self::normalize(text),
            entity_type,
        }
    }

    /// The fixed normalization rule: trim surrounding whitespace, lower-case
    pub fn normalize(text: &str) -> String {
        text.trim().to_lowercase()
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.entity_type, self.normalized_text)
    }
}

/// An entity as emitted by one wave on one chunk
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateEntity {
    /// Stable reference
    pub id: EntityRef,
    /// Entity type
    pub entity_type: EntityType,
    /// Verbatim span text
    pub text: String,
    /// Chunk-local start offset (chars), if the model reported one
    pub start_pos: Option<usize>,
    /// Chunk-local end offset (chars, exclusive), if the model reported one
    pub end_pos: Option<usize>,
    /// Model confidence
    pub confidence: f64,
    /// Wave ordinal
    pub source_wave: u8,
    /// Chunk the entity came from
    pub source_chunk: ChunkId,
}

impl CandidateEntity {
    /// Deduplication key of this entity
    pub fn key(&self) -> EntityKey {
        EntityKey::new(&self.text, self.entity_type)
    }
}

/// A relationship as emitted by a relationship wave
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateRelationship {
    /// Relationship type
    pub relationship_type: RelationshipType,
    /// Reference to the source entity
    pub source_entity_ref: EntityRef,
    /// Reference to the target entity
    pub target_entity_ref: EntityRef,
    /// Model confidence
    pub confidence: f64,
    /// Supporting text
    pub evidence_text: String,
    /// Wave ordinal
    pub source_wave: u8,
    /// Chunk the relationship came from
    pub source_chunk: ChunkId,
}

/// Token accounting for one or more backend calls
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    /// Tokens in the prompt
    pub prompt_tokens: u64,
    /// Tokens in the completion
    pub completion_tokens: u64,
}

impl TokenUsage {
    /// Create a usage record
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
        }
    }

    /// Sum of prompt and completion tokens
    pub fn total(&self) -> u64 {
        self.prompt_tokens + self.completion_tokens
    }

    /// Accumulate another usage record
    pub fn add(&mut self, other: TokenUsage) {
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
    }
}

/// Output of one (chunk, wave) unit
#[derive(Debug, Clone, PartialEq)]
pub struct RawWaveResult {
    /// Chunk processed
    pub chunk_id: ChunkId,
    /// Wave executed
    pub wave_ordinal: u8,
    /// Entity types the wave was allowed to emit
    pub entity_taxonomy: Vec<EntityType>,
    /// Entities that passed schema validation
    pub entities: Vec<CandidateEntity>,
    /// Relationships that passed schema validation (relationship waves only)
    pub relationships: Vec<CandidateRelationship>,
    /// Tokens consumed by the unit
    pub token_usage: TokenUsage,
    /// Items dropped at the schema boundary
    pub discarded: usize,
}

impl RawWaveResult {
    /// An empty result for a unit (used when a unit contributes nothing)
    pub fn empty(chunk_id: ChunkId, wave_ordinal: u8, entity_taxonomy: Vec<EntityType>) -> Self {
        Self {
            chunk_id,
            wave_ordinal,
            entity_taxonomy,
            entities: Vec::new(),
            relationships: Vec::new(),
            token_usage: TokenUsage::default(),
            discarded: 0,
        }
    }
}
