//! Explicit task graph over (chunk, wave) units

use crate::error::{ExtractorError, UnitError};
use gleaner_domain::{CandidateEntity, Chunk, ChunkId, RawWaveResult, Wave};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// One (chunk, wave) unit of work
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UnitId {
    /// Chunk the unit reads
    pub chunk: ChunkId,
    /// Wave the unit executes
    pub wave: u8,
}

impl UnitId {
    /// Create a unit id
    pub fn new(chunk: ChunkId, wave: u8) -> Self {
        Self { chunk, wave }
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.w{}", self.chunk, self.wave)
    }
}

#[derive(Debug, Clone)]
struct Node {
    dependencies: Vec<UnitId>,
    dependents: Vec<UnitId>,
    unresolved: usize,
}

/// Dependency graph of units
///
/// Edges only connect units of the same chunk: wave `b` of a chunk depends on
/// wave `a` of that chunk when `a` is listed in `b.depends_on`. Chunks are
/// independent of each other.
#[derive(Debug, Clone)]
pub struct TaskGraph {
    nodes: BTreeMap<UnitId, Node>,
    resolved: BTreeSet<UnitId>,
}

impl TaskGraph {
    /// Build the graph for every chunk crossed with every wave
    ///
    /// Fails if a wave depends on an ordinal that is not in the plan or that
    /// is not smaller than its own (which also rules out cycles).
    pub fn build(chunks: &[Chunk], waves: &[Wave]) -> Result<Self, ExtractorError> {
        let ordinals: BTreeSet<u8> = waves.iter().map(|w| w.ordinal).collect();
        if ordinals.len() != waves.len() {
            return Err(ExtractorError::Config("duplicate wave ordinals".to_string()));
        }
        for wave in waves {
            for dep in &wave.depends_on {
                if !ordinals.contains(dep) || *dep >= wave.ordinal {
                    return Err(ExtractorError::Config(format!(
                        "wave {} has invalid dependency on wave {}",
                        wave.ordinal, dep
                    )));
                }
            }
        }

        let mut nodes = BTreeMap::new();
        for chunk in chunks {
            for wave in waves {
                let id = UnitId::new(chunk.chunk_id, wave.ordinal);
                let dependencies: Vec<UnitId> = wave
                    .depends_on
                    .iter()
                    .map(|dep| UnitId::new(chunk.chunk_id, *dep))
                    .collect();
                nodes.insert(
                    id,
                    Node {
                        unresolved: dependencies.len(),
                        dependencies,
                        dependents: Vec::new(),
                    },
                );
            }
        }

        let edges: Vec<(UnitId, UnitId)> = nodes
            .iter()
            .flat_map(|(id, node)| node.dependencies.iter().map(move |dep| (*dep, *id)))
            .collect();
        for (dep, dependent) in edges {
            if let Some(node) = nodes.get_mut(&dep) {
                node.dependents.push(dependent);
            }
        }

        Ok(Self {
            nodes,
            resolved: BTreeSet::new(),
        })
    }

    /// Number of units
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if there is nothing to run
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Units with no dependencies, in (chunk, wave) order
    pub fn initial_ready(&self) -> Vec<UnitId> {
        self.nodes
            .iter()
            .filter(|(_, node)| node.dependencies.is_empty())
            .map(|(id, _)| *id)
            .collect()
    }

    /// Dependencies of a unit
    pub fn dependencies(&self, unit: UnitId) -> &[UnitId] {
        self.nodes
            .get(&unit)
            .map(|node| node.dependencies.as_slice())
            .unwrap_or(&[])
    }

    /// Mark a unit resolved (whatever its outcome) and return units that became ready
    pub fn resolve(&mut self, unit: UnitId) -> Vec<UnitId> {
        if !self.nodes.contains_key(&unit) || !self.resolved.insert(unit) {
            return Vec::new();
        }

        let dependents = self
            .nodes
            .get(&unit)
            .map(|node| node.dependents.clone())
            .unwrap_or_default();

        let mut ready = Vec::new();
        for dependent in dependents {
            if let Some(node) = self.nodes.get_mut(&dependent) {
                node.unresolved = node.unresolved.saturating_sub(1);
                if node.unresolved == 0 {
                    ready.push(dependent);
                }
            }
        }
        ready
    }

    /// True once every unit is resolved
    pub fn is_complete(&self) -> bool {
        self.resolved.len() == self.nodes.len()
    }

    /// Units not yet resolved, in (chunk, wave) order
    pub fn unresolved(&self) -> Vec<UnitId> {
        self.nodes
            .keys()
            .filter(|id| !self.resolved.contains(id))
            .copied()
            .collect()
    }
}

/// How a unit ended
#[derive(Debug, Clone)]
pub enum UnitOutcome {
    /// Backend answered and the response parsed
    Succeeded(RawWaveResult),
    /// Unit failed (or was cancelled)
    Failed(UnitError),
    /// Dependent wave skipped because its dependencies found no entities
    Skipped,
}

/// Write-once table of unit outcomes
#[derive(Debug, Default)]
pub struct ResultSlots {
    slots: BTreeMap<UnitId, UnitOutcome>,
}

impl ResultSlots {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the outcome of a unit; returns false if the slot was already filled
    pub fn fill(&mut self, unit: UnitId, outcome: UnitOutcome) -> bool {
        if self.slots.contains_key(&unit) {
            return false;
        }
        self.slots.insert(unit, outcome);
        true
    }

    /// Outcome of a unit
    pub fn get(&self, unit: UnitId) -> Option<&UnitOutcome> {
        self.slots.get(&unit)
    }

    /// Entities produced by a unit (empty unless it succeeded)
    pub fn entities(&self, unit: UnitId) -> &[CandidateEntity] {
        match self.slots.get(&unit) {
            Some(UnitOutcome::Succeeded(result)) => result.entities.as_slice(),
            _ => &[],
        }
    }

    /// Number of filled slots
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True if no slot is filled
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// All outcomes, in (chunk, wave) order
    pub fn iter(&self) -> impl Iterator<Item = (&UnitId, &UnitOutcome)> {
        self.slots.iter()
    }

    /// Consume the table, returning successful results in (chunk, wave) order
    pub fn into_results(self) -> Vec<RawWaveResult> {
        self.slots
            .into_values()
            .filter_map(|outcome| match outcome {
                UnitOutcome::Succeeded(result) => Some(result),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::waves::waves_for;
    use gleaner_domain::{EntityType, Strategy};

    fn chunks(n: u32) -> Vec<Chunk> {
        (0..n)
            .map(|i| Chunk {
                chunk_id: ChunkId(i),
                ..Chunk::whole("text")
            })
            .collect()
    }

    #[test]
    fn test_multi_wave_graph() {
        let graph = TaskGraph::build(&chunks(3), &waves_for(Strategy::MultiWave)).unwrap();
        assert_eq!(graph.len(), 12);

        let ready = graph.initial_ready();
        assert_eq!(ready.len(), 9);
        assert!(ready.iter().all(|u| u.wave <= 3));
        assert_eq!(
            graph.dependencies(UnitId::new(ChunkId(1), 4)),
            &[
                UnitId::new(ChunkId(1), 1),
                UnitId::new(ChunkId(1), 2),
                UnitId::new(ChunkId(1), 3)
            ]
        );
    }

    #[test]
    fn test_dependent_ready_after_all_dependencies() {
        let mut graph = TaskGraph::build(&chunks(2), &waves_for(Strategy::MultiWave)).unwrap();
        let c0 = ChunkId(0);

        assert!(graph.resolve(UnitId::new(c0, 1)).is_empty());
        assert!(graph.resolve(UnitId::new(c0, 3)).is_empty());
        assert_eq!(graph.resolve(UnitId::new(c0, 2)), vec![UnitId::new(c0, 4)]);

        // Resolving twice has no further effect
        assert!(graph.resolve(UnitId::new(c0, 2)).is_empty());
        assert!(!graph.is_complete());
        assert_eq!(graph.unresolved().len(), 5);
    }

    #[test]
    fn test_fallback_deep_chain() {
        let mut graph = TaskGraph::build(&chunks(1), &waves_for(Strategy::FallbackDeep)).unwrap();
        let c0 = ChunkId(0);

        assert_eq!(graph.initial_ready(), vec![UnitId::new(c0, 1)]);
        assert_eq!(graph.resolve(UnitId::new(c0, 1)), vec![UnitId::new(c0, 2)]);
        assert_eq!(graph.resolve(UnitId::new(c0, 2)), vec![UnitId::new(c0, 3)]);
        assert_eq!(graph.resolve(UnitId::new(c0, 3)), vec![UnitId::new(c0, 4)]);
        assert_eq!(graph.resolve(UnitId::new(c0, 4)), vec![UnitId::new(c0, 5)]);
        assert!(graph.resolve(UnitId::new(c0, 5)).is_empty());
        assert!(graph.is_complete());
    }

    #[test]
    fn test_rejects_forward_dependency() {
        let waves = vec![
            Wave::entities(1, "a", &[EntityType::Person]).depending_on(2),
            Wave::entities(2, "b", &[EntityType::Date]),
        ];
        assert!(TaskGraph::build(&chunks(1), &waves).is_err());
    }

    #[test]
    fn test_rejects_unknown_dependency() {
        let waves = vec![Wave::relationships(2, &[1])];
        assert!(TaskGraph::build(&chunks(1), &waves).is_err());
    }

    #[test]
    fn test_empty_plan() {
        let graph = TaskGraph::build(&chunks(2), &[]).unwrap();
        assert!(graph.is_empty());
        assert!(graph.is_complete());
    }

    #[test]
    fn test_slots_are_write_once() {
        let mut slots = ResultSlots::new();
        let unit = UnitId::new(ChunkId(0), 1);
        let result = RawWaveResult::empty(ChunkId(0), 1, vec![EntityType::Person]);

        assert!(slots.fill(unit, UnitOutcome::Succeeded(result)));
        assert!(!slots.fill(unit, UnitOutcome::Skipped));
        assert!(matches!(slots.get(unit), Some(UnitOutcome::Succeeded(_))));
        assert_eq!(slots.into_results().len(), 1);
    }

    #[test]
    fn test_unit_display() {
        assert_eq!(UnitId::new(ChunkId(2), 4).to_string(), "c2.w4");
    }
}
