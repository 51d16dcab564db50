//! Strategy selection for documents

use crate::budget::TokenBudgetEstimator;
use crate::chunking::ChunkEngine;
use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::waves::waves_for;
use gleaner_domain::{
    ChunkPlan, Document, RoutingDecision, RoutingRationale, SizeCategory, SizeProfile, Strategy,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Chooses a strategy (and chunk plan) for a document
///
/// Size category maps to strategy through a fixed table:
///
/// | Category   | Strategy             | Chunk sizing |
/// |------------|----------------------|--------------|
/// | very small | `SinglePass`         | -            |
/// | small      | `MultiWave`          | -            |
/// | medium     | `MultiWaveChunked`   | medium       |
/// | large      | `MultiWaveChunked`   | large        |
///
/// A non-chunked choice for a document that does not fit one context window
/// is promoted to `MultiWaveChunked`. Routing is a pure function of the text,
/// the override and the configuration.
#[derive(Debug, Clone)]
pub struct DocumentRouter {
    config: Arc<ExtractorConfig>,
    estimator: TokenBudgetEstimator,
}

impl DocumentRouter {
    /// Create a router
    pub fn new(config: Arc<ExtractorConfig>) -> Self {
        let estimator = TokenBudgetEstimator::from_config(&config.budget);
        Self { config, estimator }
    }

    /// Size profile of a text
    pub fn profile(&self, text: &str) -> SizeProfile {
        let char_count = text.chars().count();
        SizeProfile {
            char_count,
            estimated_tokens: self.estimator.estimate_chars(char_count),
            size_category: self.config.routing.categorize(char_count),
        }
    }

    /// True if the whole document plus prompt overhead fits one context window
    pub fn fits_single_context(&self, profile: &SizeProfile) -> bool {
        let budget = &self.config.budget;
        profile.estimated_tokens + budget.prompt_overhead_tokens <= budget.prompt_budget()
    }

    /// Route a document, optionally forcing a strategy
    ///
    /// An override skips the size table but is still checked for
    /// feasibility: a non-chunked override for a document that does not fit
    /// one context window fails with [`ExtractorError::InvalidOverride`].
    /// Blank documents always get the trivial single-pass decision.
    pub fn route(
        &self,
        document: &Document,
        strategy_override: Option<Strategy>,
    ) -> Result<RoutingDecision, ExtractorError> {
        let profile = self.profile(document.text());
        let fits = self.fits_single_context(&profile);

        if document.is_blank() {
            let reason = match strategy_override {
                Some(requested) => format!("blank document, override '{}' ignored", requested),
                None => "blank document".to_string(),
            };
            debug!(document = %document.id(), "{}", reason);
            return Ok(RoutingDecision::trivial(RoutingRationale {
                profile,
                overridden: false,
                fits_single_context: fits,
                reason,
            }));
        }

        let decision = match strategy_override {
            Some(requested) => self.route_override(document, profile, fits, requested)?,
            None => self.route_by_size(document, profile, fits)?,
        };

        info!(
            document = %document.id(),
            strategy = %decision.strategy(),
            category = profile.size_category.as_str(),
            chars = profile.char_count,
            estimated_tokens = profile.estimated_tokens,
            chunks = decision.chunk_count(),
            "Routed document"
        );

        Ok(decision)
    }

    fn route_override(
        &self,
        document: &Document,
        profile: SizeProfile,
        fits: bool,
        requested: Strategy,
    ) -> Result<RoutingDecision, ExtractorError> {
        if requested.is_chunked() {
            let rationale = RoutingRationale {
                profile,
                overridden: true,
                fits_single_context: fits,
                reason: format!("override '{}'", requested),
            };
            return self.chunked(document, rationale);
        }

        if !fits {
            return Err(ExtractorError::InvalidOverride {
                requested,
                reason: format!(
                    "document needs ~{} prompt tokens (+{} overhead), budget is {}",
                    profile.estimated_tokens,
                    self.config.budget.prompt_overhead_tokens,
                    self.config.budget.prompt_budget()
                ),
            });
        }

        Ok(RoutingDecision::single_context(
            requested,
            waves_for(requested),
            RoutingRationale {
                profile,
                overridden: true,
                fits_single_context: true,
                reason: format!("override '{}'", requested),
            },
        ))
    }

    fn route_by_size(
        &self,
        document: &Document,
        profile: SizeProfile,
        fits: bool,
    ) -> Result<RoutingDecision, ExtractorError> {
        let strategy = match profile.size_category {
            SizeCategory::VerySmall => Strategy::SinglePass,
            SizeCategory::Small => Strategy::MultiWave,
            SizeCategory::Medium | SizeCategory::Large => Strategy::MultiWaveChunked,
        };

        if strategy.is_chunked() {
            let rationale = RoutingRationale {
                profile,
                overridden: false,
                fits_single_context: fits,
                reason: format!("{} document", profile.size_category.as_str()),
            };
            return self.chunked(document, rationale);
        }

        if !fits {
            let rationale = RoutingRationale {
                profile,
                overridden: false,
                fits_single_context: false,
                reason: format!(
                    "{} document exceeds one context window, promoted to chunked",
                    profile.size_category.as_str()
                ),
            };
            return self.chunked(document, rationale);
        }

        Ok(RoutingDecision::single_context(
            strategy,
            waves_for(strategy),
            RoutingRationale {
                profile,
                overridden: false,
                fits_single_context: true,
                reason: format!("{} document", profile.size_category.as_str()),
            },
        ))
    }

    fn chunked(
        &self,
        document: &Document,
        rationale: RoutingRationale,
    ) -> Result<RoutingDecision, ExtractorError> {
        let sizing = self.config.chunking.sizing_for(rationale.profile.size_category);
        let chunks = ChunkEngine::split_with(document.text(), sizing)?;
        let plan = ChunkPlan {
            chunks,
            target_size: sizing.target_size,
            overlap_size: sizing.overlap_size,
            min_size: sizing.min_size,
        };
        Ok(RoutingDecision::chunked(
            plan,
            waves_for(Strategy::MultiWaveChunked),
            rationale,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router() -> DocumentRouter {
        DocumentRouter::new(Arc::new(ExtractorConfig::default()))
    }

    fn doc(len: usize) -> Document {
        Document::new("Lorem ipsum dolor sit amet. ".repeat(len / 28 + 1)[..len].to_string())
    }

    #[test]
    fn test_profile() {
        let profile = router().profile("abcdef");
        assert_eq!(profile.char_count, 6);
        assert_eq!(profile.estimated_tokens, 2);
        assert_eq!(profile.size_category, SizeCategory::VerySmall);
    }

    #[test]
    fn test_size_table() {
        let r = router();
        assert_eq!(r.route(&doc(1_000), None).unwrap().strategy(), Strategy::SinglePass);
        assert_eq!(r.route(&doc(10_000), None).unwrap().strategy(), Strategy::MultiWave);
        assert_eq!(r.route(&doc(50_000), None).unwrap().strategy(), Strategy::MultiWaveChunked);
        assert_eq!(r.route(&doc(150_000), None).unwrap().strategy(), Strategy::MultiWaveChunked);
    }

    #[test]
    fn test_threshold_boundary_goes_to_larger_category() {
        let r = router();
        let below = r.route(&doc(4_999), None).unwrap();
        let at = r.route(&doc(5_000), None).unwrap();
        let above = r.route(&doc(5_001), None).unwrap();

        assert_eq!(below.rationale().profile.size_category, SizeCategory::VerySmall);
        assert_eq!(below.strategy(), Strategy::SinglePass);
        assert_eq!(at.rationale().profile.size_category, SizeCategory::Small);
        assert_eq!(at.strategy(), Strategy::MultiWave);
        assert_eq!(above.strategy(), Strategy::MultiWave);
    }

    #[test]
    fn test_chunked_decision_carries_plan() {
        let decision = router().route(&doc(50_000), None).unwrap();
        let plan = decision.chunk_plan().unwrap();
        assert_eq!(plan.target_size, 12_000);
        assert!(plan.chunks.len() >= 4);
        assert_eq!(decision.expected_waves().len(), 4);
    }

    #[test]
    fn test_large_documents_use_large_sizing() {
        let decision = router().route(&doc(120_000), None).unwrap();
        let plan = decision.chunk_plan().unwrap();
        assert_eq!(plan.target_size, 8_000);
        assert_eq!(plan.overlap_size, 500);
        assert!(plan.chunks.len() >= 15);
    }

    #[test]
    fn test_small_document_that_does_not_fit_is_promoted() {
        // 19_800 chars is small but ~6_600 tokens + 600 overhead > 7_168
        let decision = router().route(&doc(19_800), None).unwrap();
        assert_eq!(decision.rationale().profile.size_category, SizeCategory::Small);
        assert_eq!(decision.strategy(), Strategy::MultiWaveChunked);
        assert!(!decision.rationale().fits_single_context);
    }

    #[test]
    fn test_blank_document_is_trivial() {
        let r = router();
        for text in ["", "   \n\t "] {
            let decision = r.route(&Document::new(text), Some(Strategy::FallbackDeep)).unwrap();
            assert_eq!(decision.strategy(), Strategy::SinglePass);
            assert!(decision.expected_waves().is_empty());
            assert!(decision.chunk_plan().is_none());
        }
    }

    #[test]
    fn test_override_single_pass_too_large() {
        let result = router().route(&doc(50_000), Some(Strategy::SinglePass));
        assert!(matches!(
            result,
            Err(ExtractorError::InvalidOverride { requested: Strategy::SinglePass, .. })
        ));
    }

    #[test]
    fn test_override_fallback_deep_small_document() {
        let decision = router().route(&doc(3_000), Some(Strategy::FallbackDeep)).unwrap();
        assert_eq!(decision.strategy(), Strategy::FallbackDeep);
        assert!(decision.rationale().overridden);
        assert_eq!(decision.expected_waves().len(), 5);
    }

    #[test]
    fn test_override_chunked_always_feasible() {
        let decision = router().route(&doc(1_000), Some(Strategy::MultiWaveChunked)).unwrap();
        assert_eq!(decision.strategy(), Strategy::MultiWaveChunked);
        assert_eq!(decision.chunk_count(), 1);
    }

    #[test]
    fn test_route_is_deterministic() {
        let r = router();
        let document = doc(64_000);
        assert_eq!(r.route(&document, None).unwrap(), r.route(&document, None).unwrap());
    }
}
