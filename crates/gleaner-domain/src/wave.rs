//! Wave module - ordered extraction stages

use crate::taxonomy::{EntityType, RelationshipType};

/// What a wave extracts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WaveKind {
    /// Extracts entities of the wave's target types
    Entities,
    /// Extracts relationships between entities found by its dependency waves
    Relationships,
}

/// A named extraction stage
///
/// Ordinals are 1-based and unique within a plan. A wave listed in another
/// wave's `depends_on` must complete for a chunk before the dependent wave
/// starts on that chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wave {
    /// Position in the strategy's wave order (1..N)
    pub ordinal: u8,
    /// Stable wave name (also used for logging)
    pub name: String,
    /// Entity or relationship wave
    pub kind: WaveKind,
    /// Entity types this wave may emit (closed taxonomy for the wave)
    pub target_types: Vec<EntityType>,
    /// Relationship types this wave may emit
    pub relationship_types: Vec<RelationshipType>,
    /// Ordinals of waves whose entities this wave consumes
    pub depends_on: Vec<u8>,
    /// Prompt template identifier
    pub template: String,
}

impl Wave {
    /// Create an entity wave with no dependencies
    pub fn entities(ordinal: u8, name: &str, target_types: &[EntityType]) -> Self {
        Self {
            ordinal,
            name: name.to_string(),
            kind: WaveKind::Entities,
            target_types: target_types.to_vec(),
            relationship_types: Vec::new(),
            depends_on: Vec::new(),
            template: name.to_string(),
        }
    }

    /// Create a relationship wave depending on the given entity waves
    pub fn relationships(ordinal: u8, depends_on: &[u8]) -> Self {
        Self {
            ordinal,
            name: "relationships".to_string(),
            kind: WaveKind::Relationships,
            target_types: Vec::new(),
            relationship_types: RelationshipType::ALL.to_vec(),
            depends_on: depends_on.to_vec(),
            template: "relationships".to_string(),
        }
    }

    /// Add a dependency (builder style)
    pub fn depending_on(mut self, ordinal: u8) -> Self {
        if !self.depends_on.contains(&ordinal) {
            self.depends_on.push(ordinal);
            self.depends_on.sort_unstable();
        }
        self
    }

    /// True if the wave emits relationships
    pub fn is_relationship_wave(&self) -> bool {
        self.kind == WaveKind::Relationships
    }

    /// True if `entity_type` belongs to this wave's taxonomy
    pub fn accepts(&self, entity_type: EntityType) -> bool {
        self.target_types.contains(&entity_type)
    }
}
