//! Final, reconciled extraction output

use crate::chunk::ChunkId;
use crate::entity::EntityKey;
use crate::stats::ProcessingStats;
use crate::taxonomy::{EntityType, RelationshipType};

/// One deduplicated entity
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledEntity {
    /// Deduplication key
    pub key: EntityKey,
    /// Verbatim text of the winning candidate
    pub text: String,
    /// Highest confidence observed
    pub confidence: f64,
    /// Wave of the winning candidate
    pub source_wave: u8,
    /// Chunk of the winning candidate
    pub source_chunk: ChunkId,
    /// Start offset of the winning candidate, local to `source_chunk`
    pub start_pos: Option<usize>,
    /// End offset of the winning candidate, local to `source_chunk`
    pub end_pos: Option<usize>,
    /// Number of candidates merged into this entity
    pub mentions: usize,
}

impl ReconciledEntity {
    /// Entity type
    pub fn entity_type(&self) -> EntityType {
        self.key.entity_type
    }
}

/// One deduplicated relationship between two reconciled entities
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledRelationship {
    /// Relationship type
    pub relationship_type: RelationshipType,
    /// Key of the source entity
    pub source: EntityKey,
    /// Key of the target entity
    pub target: EntityKey,
    /// Highest confidence observed
    pub confidence: f64,
    /// Evidence of the winning candidate
    pub evidence_text: String,
    /// Wave of the winning candidate
    pub source_wave: u8,
    /// Chunk of the winning candidate
    pub source_chunk: ChunkId,
    /// Number of candidates merged into this relationship
    pub mentions: usize,
}

/// The final output of the pipeline
///
/// Built once by the reconciler and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledResult {
    entities: Vec<ReconciledEntity>,
    relationships: Vec<ReconciledRelationship>,
    processing_stats: ProcessingStats,
}

impl ReconciledResult {
    /// Assemble a result
    pub fn new(
        entities: Vec<ReconciledEntity>,
        relationships: Vec<ReconciledRelationship>,
        processing_stats: ProcessingStats,
    ) -> Self {
        Self {
            entities,
            relationships,
            processing_stats,
        }
    }

    /// A result with nothing in it
    pub fn empty(processing_stats: ProcessingStats) -> Self {
        Self::new(Vec::new(), Vec::new(), processing_stats)
    }

    /// Entities, by descending confidence
    pub fn entities(&self) -> &[ReconciledEntity] {
        &self.entities
    }

    /// Relationships, by descending confidence
    pub fn relationships(&self) -> &[ReconciledRelationship] {
        &self.relationships
    }

    /// Processing statistics
    pub fn processing_stats(&self) -> &ProcessingStats {
        &self.processing_stats
    }

    /// Find an entity by text (normalized) and type
    pub fn find_entity(&self, text: &str, entity_type: EntityType) -> Option<&ReconciledEntity> {
        let key = EntityKey::new(text, entity_type);
        self.entities.iter().find(|e| e.key == key)
    }

    /// Entities of one type
    pub fn entities_of(&self, entity_type: EntityType) -> impl Iterator<Item = &ReconciledEntity> {
        self.entities
            .iter()
            .filter(move |e| e.key.entity_type == entity_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_entity_normalizes() {
        let entity = ReconciledEntity {
            key: EntityKey::new("Acme", EntityType::Organization),
            text: "Acme".to_string(),
            confidence: 0.9,
            source_wave: 1,
            source_chunk: ChunkId(0),
            start_pos: Some(0),
            end_pos: Some(4),
            mentions: 1,
        };
        let result = ReconciledResult::new(vec![entity], Vec::new(), ProcessingStats::new());

        assert!(result.find_entity(" ACME ", EntityType::Organization).is_some());
        assert!(result.find_entity("Acme", EntityType::Person).is_none());
        assert_eq!(result.entities_of(EntityType::Organization).count(), 1);
    }
}
