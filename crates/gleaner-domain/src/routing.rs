//! Routing module - size classification and strategy decisions

use crate::chunk::Chunk;
use crate::wave::Wave;

/// Coarse size class of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SizeCategory {
    /// Fits comfortably in one prompt
    VerySmall,
    /// Fits in one prompt per wave
    Small,
    /// Needs chunking
    Medium,
    /// Needs aggressive chunking
    Large,
}

impl SizeCategory {
    /// Get the category name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            SizeCategory::VerySmall => "very_small",
            SizeCategory::Small => "small",
            SizeCategory::Medium => "medium",
            SizeCategory::Large => "large",
        }
    }
}

/// Size measurements computed once per document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeProfile {
    /// Length in characters
    pub char_count: usize,
    /// Conservative token estimate
    pub estimated_tokens: usize,
    /// Category derived from the thresholds
    pub size_category: SizeCategory,
}

/// Processing strategy for a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// One combined wave over the whole document
    SinglePass,
    /// Several waves over the whole document
    MultiWave,
    /// Several waves over each chunk of the document
    MultiWaveChunked,
    /// Every wave in strict order, plus a catch-all sweep wave
    FallbackDeep,
}

impl Strategy {
    /// Get the strategy name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::SinglePass => "single_pass",
            Strategy::MultiWave => "multi_wave",
            Strategy::MultiWaveChunked => "multi_wave_chunked",
            Strategy::FallbackDeep => "fallback_deep",
        }
    }

    /// Parse a strategy name (case-insensitive, `-` or `_` separated)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "single_pass" => Some(Strategy::SinglePass),
            "multi_wave" => Some(Strategy::MultiWave),
            "multi_wave_chunked" => Some(Strategy::MultiWaveChunked),
            "fallback_deep" => Some(Strategy::FallbackDeep),
            _ => None,
        }
    }

    /// True if the strategy splits the document into chunks
    pub fn is_chunked(&self) -> bool {
        matches!(self, Strategy::MultiWaveChunked)
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid strategy: {}", s))
    }
}

/// Chunks plus the parameters that produced them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkPlan {
    /// Chunks in ascending sequence order
    pub chunks: Vec<Chunk>,
    /// Target chunk length in characters
    pub target_size: usize,
    /// Overlap between consecutive chunks in characters
    pub overlap_size: usize,
    /// Minimum length of any non-final chunk
    pub min_size: usize,
}

/// Why the router chose what it chose
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingRationale {
    /// Size measurements of the document
    pub profile: SizeProfile,
    /// True when the caller supplied the strategy
    pub overridden: bool,
    /// True when the whole document fits one prompt
    pub fits_single_context: bool,
    /// Human-readable explanation
    pub reason: String,
}

/// The strategy chosen for a document, plus its chunk plan when chunked
///
/// Constructed only through [`RoutingDecision::single_context`],
/// [`RoutingDecision::chunked`] and [`RoutingDecision::trivial`], so a chunk
/// plan is present exactly when the strategy is `MultiWaveChunked`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingDecision {
    strategy: Strategy,
    chunk_plan: Option<ChunkPlan>,
    expected_waves: Vec<Wave>,
    rationale: RoutingRationale,
}

impl RoutingDecision {
    /// Decision for a strategy that processes the document as a whole
    ///
    /// # Panics
    /// Panics if `strategy` is chunked; use [`RoutingDecision::chunked`].
    pub fn single_context(strategy: Strategy, waves: Vec<Wave>, rationale: RoutingRationale) -> Self {
        assert!(!strategy.is_chunked(), "chunked strategy requires a chunk plan");
        Self {
            strategy,
            chunk_plan: None,
            expected_waves: waves,
            rationale,
        }
    }

    /// Decision for the chunked strategy
    pub fn chunked(plan: ChunkPlan, waves: Vec<Wave>, rationale: RoutingRationale) -> Self {
        Self {
            strategy: Strategy::MultiWaveChunked,
            chunk_plan: Some(plan),
            expected_waves: waves,
            rationale,
        }
    }

    /// Decision for an empty document: single pass, nothing to run
    pub fn trivial(rationale: RoutingRationale) -> Self {
        Self {
            strategy: Strategy::SinglePass,
            chunk_plan: None,
            expected_waves: Vec::new(),
            rationale,
        }
    }

    /// Chosen strategy
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Chunk plan (present iff the strategy is chunked)
    pub fn chunk_plan(&self) -> Option<&ChunkPlan> {
        self.chunk_plan.as_ref()
    }

    /// Waves to run, in strategy order
    pub fn expected_waves(&self) -> &[Wave] {
        &self.expected_waves
    }

    /// Ordinals of the expected waves
    pub fn wave_ordinals(&self) -> Vec<u8> {
        self.expected_waves.iter().map(|w| w.ordinal).collect()
    }

    /// Observability metadata
    pub fn rationale(&self) -> &RoutingRationale {
        &self.rationale
    }

    /// Number of chunks the orchestrator will process (1 when not chunked)
    pub fn chunk_count(&self) -> usize {
        self.chunk_plan.as_ref().map_or(1, |p| p.chunks.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rationale() -> RoutingRationale {
        RoutingRationale {
            profile: SizeProfile {
                char_count: 0,
                estimated_tokens: 0,
                size_category: SizeCategory::VerySmall,
            },
            overridden: false,
            fits_single_context: true,
            reason: "test".to_string(),
        }
    }

    #[test]
    fn test_strategy_parse() {
        assert_eq!(Strategy::parse("multi-wave-chunked"), Some(Strategy::MultiWaveChunked));
        assert_eq!(Strategy::parse("SINGLE_PASS"), Some(Strategy::SinglePass));
        assert_eq!(Strategy::parse("bogus"), None);
    }

    #[test]
    fn test_trivial_decision() {
        let decision = RoutingDecision::trivial(rationale());
        assert_eq!(decision.strategy(), Strategy::SinglePass);
        assert!(decision.expected_waves().is_empty());
        assert!(decision.chunk_plan().is_none());
    }

    #[test]
    fn test_chunked_decision_has_plan() {
        let plan = ChunkPlan {
            chunks: vec![Chunk::whole("abc")],
            target_size: 10,
            overlap_size: 2,
            min_size: 1,
        };
        let decision = RoutingDecision::chunked(plan, Vec::new(), rationale());
        assert_eq!(decision.strategy(), Strategy::MultiWaveChunked);
        assert_eq!(decision.chunk_count(), 1);
    }

    #[test]
    #[should_panic]
    fn test_single_context_rejects_chunked_strategy() {
        RoutingDecision::single_context(Strategy::MultiWaveChunked, Vec::new(), rationale());
    }

    #[test]
    fn test_size_category_ordering() {
        assert!(SizeCategory::VerySmall < SizeCategory::Small);
        assert!(SizeCategory::Medium < SizeCategory::Large);
    }
}
