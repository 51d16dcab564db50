//! Merge raw wave results into one ranked, deduplicated result
//!
//! Candidates pass the [`Gatekeeper`] first, then collapse onto their
//! `(normalized text, entity type)` key. Relationships are re-keyed from
//! entity refs to entity keys, so the same relationship found in two
//! overlapping chunks merges into one.

use crate::config::ExtractorConfig;
use gleaner_domain::{
    CandidateEntity, CandidateRelationship, EntityKey, EntityRef, ProcessingStats, RawWaveResult,
    ReconciledEntity, ReconciledRelationship, ReconciledResult, RelationshipType,
};
use gleaner_gatekeeper::{Gatekeeper, RejectionReason, ValidationConfig};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// Validates, deduplicates and ranks candidates
///
/// The output depends only on the set of input results, not their order.
#[derive(Debug, Clone)]
pub struct EntityReconciler {
    gatekeeper: Gatekeeper,
}

impl EntityReconciler {
    /// Create a reconciler with the given validation rules
    pub fn new(config: ValidationConfig) -> Self {
        Self {
            gatekeeper: Gatekeeper::new(config),
        }
    }

    /// Create a reconciler from the `validation` section of a config
    pub fn from_config(config: &ExtractorConfig) -> Self {
        Self::new(config.validation.clone())
    }

    /// The gatekeeper applying the validation rules
    pub fn gatekeeper(&self) -> &Gatekeeper {
        &self.gatekeeper
    }

    /// Reconcile raw results with fresh stats
    pub fn reconcile(&self, results: &[RawWaveResult]) -> ReconciledResult {
        self.reconcile_with_stats(results, ProcessingStats::new())
    }

    /// Reconcile raw results, adding rejection and merge counters to `stats`
    pub fn reconcile_with_stats(
        &self,
        results: &[RawWaveResult],
        mut stats: ProcessingStats,
    ) -> ReconciledResult {
        let mut resolved: BTreeMap<EntityRef, EntityKey> = BTreeMap::new();
        let mut entities: BTreeMap<EntityKey, Merged<&CandidateEntity, EntityRef>> = BTreeMap::new();

        for result in results {
            for entity in &result.entities {
                let validation = self
                    .gatekeeper
                    .validate_entity(entity, &result.entity_taxonomy);
                if !validation.is_accepted() {
                    debug!(entity = %entity.id, "Rejected entity: {:?}", validation.reasons);
                    stats.entities_rejected += 1;
                    continue;
                }

                let key = entity.key();
                resolved.insert(entity.id, key.clone());
                entities
                    .entry(key)
                    .and_modify(|merged| merged.offer(entity, entity.id, prefer_entity))
                    .or_insert_with(|| Merged::new(entity, entity.id));
            }
        }

        let mut relationships: BTreeMap<RelationshipKey, MergedRelationship<'_>> = BTreeMap::new();

        for result in results {
            for relationship in &result.relationships {
                let validation = self.gatekeeper.validate_relationship(relationship);
                if !validation.is_accepted() {
                    debug!("Rejected relationship: {:?}", validation.reasons);
                    stats.relationships_rejected += 1;
                    continue;
                }

                let endpoints = (
                    resolved.get(&relationship.source_entity_ref),
                    resolved.get(&relationship.target_entity_ref),
                );
                let (Some(source), Some(target)) = endpoints else {
                    let missing = if endpoints.0.is_none() {
                        relationship.source_entity_ref
                    } else {
                        relationship.target_entity_ref
                    };
                    debug!(
                        "Rejected relationship: {:?}",
                        RejectionReason::UnresolvedReference(missing)
                    );
                    stats.relationships_rejected += 1;
                    continue;
                };

                let key = RelationshipKey {
                    source: source.clone(),
                    target: target.clone(),
                    relationship_type: relationship.relationship_type,
                };
                let mention = (
                    relationship.source_entity_ref,
                    relationship.target_entity_ref,
                );
                relationships
                    .entry(key)
                    .and_modify(|merged| merged.offer(relationship, mention, prefer_relationship))
                    .or_insert_with(|| Merged::new(relationship, mention));
            }
        }

        stats.duplicates_merged += entities.values().map(|m| m.candidates - 1).sum::<usize>();
        stats.duplicates_merged += relationships
            .values()
            .map(|m| m.candidates - 1)
            .sum::<usize>();

        let mut entities: Vec<ReconciledEntity> = entities
            .into_iter()
            .map(|(key, merged)| {
                let best = merged.best;
                ReconciledEntity {
                    key,
                    text: best.text.clone(),
                    confidence: best.confidence,
                    source_wave: best.source_wave,
                    source_chunk: best.source_chunk,
                    start_pos: best.start_pos,
                    end_pos: best.end_pos,
                    mentions: merged.mentions.len(),
                }
            })
            .collect();
        entities.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then_with(|| a.source_chunk.cmp(&b.source_chunk))
                .then_with(|| position(a.start_pos).cmp(&position(b.start_pos)))
                .then_with(|| a.key.cmp(&b.key))
        });

        let mut relationships: Vec<ReconciledRelationship> = relationships
            .into_iter()
            .map(|(key, merged)| {
                let best = merged.best;
                ReconciledRelationship {
                    relationship_type: key.relationship_type,
                    source: key.source,
                    target: key.target,
                    confidence: best.confidence,
                    evidence_text: best.evidence_text.clone(),
                    source_wave: best.source_wave,
                    source_chunk: best.source_chunk,
                    mentions: merged.mentions.len(),
                }
            })
            .collect();
        relationships.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then_with(|| a.source.cmp(&b.source))
                .then_with(|| a.target.cmp(&b.target))
                .then_with(|| a.relationship_type.cmp(&b.relationship_type))
        });

        info!(
            entities = entities.len(),
            relationships = relationships.len(),
            rejected_entities = stats.entities_rejected,
            rejected_relationships = stats.relationships_rejected,
            merged = stats.duplicates_merged,
            "Reconciled results"
        );

        ReconciledResult::new(entities, relationships, stats)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct RelationshipKey {
    source: EntityKey,
    target: EntityKey,
    relationship_type: RelationshipType,
}

type MergedRelationship<'a> = Merged<&'a CandidateRelationship, (EntityRef, EntityRef)>;

/// The winning candidate for one key, plus the distinct mentions seen
struct Merged<T, M> {
    best: T,
    mentions: BTreeSet<M>,
    candidates: usize,
}

impl<T: Copy, M: Ord> Merged<T, M> {
    fn new(candidate: T, mention: M) -> Self {
        Self {
            best: candidate,
            mentions: BTreeSet::from([mention]),
            candidates: 1,
        }
    }

    fn offer(&mut self, candidate: T, mention: M, prefer: fn(T, T) -> Ordering) {
        self.candidates += 1;
        self.mentions.insert(mention);
        if prefer(candidate, self.best) == Ordering::Less {
            self.best = candidate;
        }
    }
}

/// `Less` means `a` wins: higher confidence, then earlier wave, then earlier position
fn prefer_entity(a: &CandidateEntity, b: &CandidateEntity) -> Ordering {
    b.confidence
        .total_cmp(&a.confidence)
        .then_with(|| a.source_wave.cmp(&b.source_wave))
        .then_with(|| a.source_chunk.cmp(&b.source_chunk))
        .then_with(|| position(a.start_pos).cmp(&position(b.start_pos)))
        .then_with(|| a.text.cmp(&b.text))
        .then_with(|| a.id.cmp(&b.id))
}

fn prefer_relationship(a: &CandidateRelationship, b: &CandidateRelationship) -> Ordering {
    b.confidence
        .total_cmp(&a.confidence)
        .then_with(|| a.source_wave.cmp(&b.source_wave))
        .then_with(|| a.source_chunk.cmp(&b.source_chunk))
        .then_with(|| a.evidence_text.cmp(&b.evidence_text))
        .then_with(|| a.source_entity_ref.cmp(&b.source_entity_ref))
        .then_with(|| a.target_entity_ref.cmp(&b.target_entity_ref))
}

/// Unknown positions sort last
fn position(pos: Option<usize>) -> usize {
    pos.unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gleaner_domain::{ChunkId, EntityType};

    fn entity(chunk: u32, wave: u8, index: u32, kind: EntityType, text: &str, confidence: f64) -> CandidateEntity {
        CandidateEntity {
            id: EntityRef::new(ChunkId(chunk), wave, index),
            entity_type: kind,
            text: text.to_string(),
            start_pos: Some(index as usize * 10),
            end_pos: Some(index as usize * 10 + text.len()),
            confidence,
            source_wave: wave,
            source_chunk: ChunkId(chunk),
        }
    }

    fn result(chunk: u32, wave: u8, entities: Vec<CandidateEntity>) -> RawWaveResult {
        let mut result = RawWaveResult::empty(ChunkId(chunk), wave, EntityType::ALL.to_vec());
        result.entities = entities;
        result
    }

    fn relationship(source: EntityRef, target: EntityRef, confidence: f64) -> CandidateRelationship {
        CandidateRelationship {
            relationship_type: RelationshipType::EmployedBy,
            source_entity_ref: source,
            target_entity_ref: target,
            confidence,
            evidence_text: "works at".to_string(),
            source_wave: 4,
            source_chunk: source.chunk,
        }
    }

    fn reconciler() -> EntityReconciler {
        EntityReconciler::new(ValidationConfig::default())
    }

    #[test]
    fn test_dedup_keeps_highest_confidence() {
        let results = vec![
            result(0, 1, vec![entity(0, 1, 0, EntityType::Person, "Alice Smith", 0.8)]),
            result(1, 1, vec![entity(1, 1, 0, EntityType::Person, "  alice smith ", 0.95)]),
        ];

        let reconciled = reconciler().reconcile(&results);
        assert_eq!(reconciled.entities().len(), 1);
        let alice = &reconciled.entities()[0];
        assert_eq!(alice.confidence, 0.95);
        assert_eq!(alice.source_chunk, ChunkId(1));
        assert_eq!(alice.mentions, 2);
        assert_eq!(reconciled.processing_stats().duplicates_merged, 1);
    }

    #[test]
    fn test_same_text_different_type_kept_apart() {
        let results = vec![result(
            0,
            1,
            vec![
                entity(0, 1, 0, EntityType::Person, "Jordan", 0.9),
                entity(0, 1, 1, EntityType::Location, "Jordan", 0.9),
            ],
        )];
        assert_eq!(reconciler().reconcile(&results).entities().len(), 2);
    }

    #[test]
    fn test_confidence_tie_prefers_earlier_wave() {
        let first = result(0, 1, vec![entity(0, 1, 0, EntityType::Date, "1 May 2020", 0.9)]);
        let later = result(0, 2, vec![entity(0, 2, 0, EntityType::Date, "1 May 2020", 0.9)]);

        for results in [vec![first.clone(), later.clone()], vec![later, first]] {
            let reconciled = reconciler().reconcile(&results);
            assert_eq!(reconciled.entities().len(), 1);
            assert_eq!(reconciled.entities()[0].source_wave, 1);
        }
    }

    #[test]
    fn test_validation_rejects_before_dedup() {
        let mut wave_two = result(
            0,
            2,
            vec![
                entity(0, 2, 0, EntityType::Person, "Alice", 0.99),
                entity(0, 2, 1, EntityType::Date, "2020", 0.5),
                entity(0, 2, 2, EntityType::Date, "2021", 0.8),
            ],
        );
        wave_two.entity_taxonomy = vec![EntityType::Date];

        let reconciled = reconciler().reconcile(&[wave_two]);
        let stats = reconciled.processing_stats();
        // Person outside the wave taxonomy, 0.5 below the confidence floor
        assert_eq!(stats.entities_rejected, 2);
        assert_eq!(reconciled.entities().len(), 1);
        assert_eq!(reconciled.entities()[0].text, "2021");
    }

    #[test]
    fn test_relationships_resolve_through_keys() {
        let alice = entity(0, 1, 0, EntityType::Person, "Alice", 0.9);
        let acme = entity(0, 1, 1, EntityType::Organization, "Acme", 0.9);
        let alice_again = entity(1, 1, 0, EntityType::Person, "ALICE", 0.8);
        let acme_again = entity(1, 1, 1, EntityType::Organization, "acme", 0.8);

        let mut rel_c0 = RawWaveResult::empty(ChunkId(0), 4, Vec::new());
        rel_c0.relationships = vec![relationship(alice.id, acme.id, 0.85)];
        let mut rel_c1 = RawWaveResult::empty(ChunkId(1), 4, Vec::new());
        rel_c1.relationships = vec![
            relationship(alice_again.id, acme_again.id, 0.9),
            relationship(alice_again.id, EntityRef::new(ChunkId(1), 1, 9), 0.9),
        ];

        let results = vec![
            result(0, 1, vec![alice, acme]),
            result(1, 1, vec![alice_again, acme_again]),
            rel_c0,
            rel_c1,
        ];
        let reconciled = reconciler().reconcile(&results);

        assert_eq!(reconciled.relationships().len(), 1);
        let employed = &reconciled.relationships()[0];
        assert_eq!(employed.source, EntityKey::new("alice", EntityType::Person));
        assert_eq!(employed.target, EntityKey::new("acme", EntityType::Organization));
        assert_eq!(employed.confidence, 0.9);
        assert_eq!(employed.mentions, 2);
        assert_eq!(reconciled.processing_stats().relationships_rejected, 1);
    }

    #[test]
    fn test_relationship_to_rejected_entity_is_dropped() {
        let alice = entity(0, 1, 0, EntityType::Person, "Alice", 0.9);
        let weak = entity(0, 1, 1, EntityType::Organization, "Acme", 0.3);
        let mut rel = RawWaveResult::empty(ChunkId(0), 4, Vec::new());
        rel.relationships = vec![relationship(alice.id, weak.id, 0.9)];

        let reconciled = reconciler().reconcile(&[result(0, 1, vec![alice, weak]), rel]);
        assert!(reconciled.relationships().is_empty());
        assert_eq!(reconciled.processing_stats().entities_rejected, 1);
        assert_eq!(reconciled.processing_stats().relationships_rejected, 1);
    }

    #[test]
    fn test_relationship_citing_another_chunk_is_dropped() {
        let alice = entity(0, 1, 0, EntityType::Person, "Alice", 0.9);
        let acme = entity(0, 1, 1, EntityType::Organization, "Acme", 0.9);
        let mut cross = relationship(alice.id, acme.id, 0.9);
        cross.source_chunk = ChunkId(5);
        let mut rel = RawWaveResult::empty(ChunkId(5), 4, Vec::new());
        rel.relationships = vec![cross];

        let reconciled = reconciler().reconcile(&[result(0, 1, vec![alice, acme]), rel]);
        assert_eq!(reconciled.entities().len(), 2);
        assert!(reconciled.relationships().is_empty());
        assert_eq!(reconciled.processing_stats().relationships_rejected, 1);
    }

    #[test]
    fn test_output_order() {
        let results = vec![result(
            0,
            1,
            vec![
                entity(0, 1, 0, EntityType::Person, "Bob", 0.8),
                entity(0, 1, 1, EntityType::Person, "Carol", 0.95),
                entity(0, 1, 2, EntityType::Person, "Alice", 0.8),
            ],
        )];

        let reconciled = reconciler().reconcile(&results);
        let texts: Vec<&str> = reconciled.entities().iter().map(|e| e.text.as_str()).collect();
        // Equal confidence falls back to position
        assert_eq!(texts, vec!["Carol", "Bob", "Alice"]);
    }

    #[test]
    fn test_reconcile_twice_is_identical() {
        let results = vec![
            result(0, 1, vec![entity(0, 1, 0, EntityType::Person, "Alice", 0.9)]),
            result(1, 1, vec![entity(1, 1, 0, EntityType::Person, "alice", 0.9)]),
        ];
        let r = reconciler();
        assert_eq!(r.reconcile(&results), r.reconcile(&results));

        let doubled: Vec<RawWaveResult> = results.iter().chain(results.iter()).cloned().collect();
        assert_eq!(r.reconcile(&doubled).entities(), r.reconcile(&results).entities());
    }

    #[test]
    fn test_empty_input() {
        let reconciled = reconciler().reconcile(&[]);
        assert!(reconciled.entities().is_empty());
        assert!(reconciled.relationships().is_empty());
    }
}
