//! Route, orchestrate and reconcile in one call

use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::orchestrator::{CancelHandle, WaveOrchestrator};
use crate::reconciler::EntityReconciler;
use crate::router::DocumentRouter;
use gleaner_domain::traits::{CompletionBackend, PatternExampleProvider};
use gleaner_domain::{Document, ReconciledResult, RoutingDecision, Strategy};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// The extraction pipeline: document in, reconciled entities out
///
/// Holds one immutable configuration shared by every stage. Several
/// pipelines with different configurations can run side by side.
pub struct ExtractionPipeline<B, P> {
    config: Arc<ExtractorConfig>,
    router: DocumentRouter,
    orchestrator: WaveOrchestrator<B, P>,
    reconciler: EntityReconciler,
}

impl<B, P> ExtractionPipeline<B, P>
where
    B: CompletionBackend + Send + Sync + 'static,
    B::Error: fmt::Display,
    P: PatternExampleProvider + Send + Sync,
{
    /// Create a pipeline, rejecting an invalid configuration
    pub fn new(backend: B, patterns: P, config: ExtractorConfig) -> Result<Self, ExtractorError> {
        config.validate()?;
        let config = Arc::new(config);

        Ok(Self {
            router: DocumentRouter::new(Arc::clone(&config)),
            orchestrator: WaveOrchestrator::new(
                Arc::new(backend),
                Arc::new(patterns),
                Arc::clone(&config),
            ),
            reconciler: EntityReconciler::from_config(&config),
            config,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Routing decision for a document, without calling the backend
    pub fn route(
        &self,
        document: &Document,
        strategy_override: Option<Strategy>,
    ) -> Result<RoutingDecision, ExtractorError> {
        self.router.route(document, strategy_override)
    }

    /// Extract entities and relationships from a document
    ///
    /// Fails only with [`ExtractorError::InvalidOverride`] (before any
    /// backend call) or [`ExtractorError::DocumentFailure`]. Every other
    /// problem degrades the result and shows up in its processing stats.
    pub async fn extract(
        &self,
        document: &Document,
        strategy_override: Option<Strategy>,
    ) -> Result<ReconciledResult, ExtractorError> {
        self.extract_with_cancel(document, strategy_override, &CancelHandle::new())
            .await
    }

    /// Extract, stopping early when `cancel` fires
    ///
    /// Units completed before cancellation are still reconciled.
    pub async fn extract_with_cancel(
        &self,
        document: &Document,
        strategy_override: Option<Strategy>,
        cancel: &CancelHandle,
    ) -> Result<ReconciledResult, ExtractorError> {
        let started = Instant::now();

        let decision = self.router.route(document, strategy_override)?;
        let outcome = self
            .orchestrator
            .run_with_cancel(&decision, document, cancel)
            .await?;

        let mut stats = outcome.stats;
        stats.wall_time_ms = started.elapsed().as_millis() as u64;
        let result = self.reconciler.reconcile_with_stats(&outcome.results, stats);

        info!(
            document = %document.id(),
            strategy = %decision.strategy(),
            entities = result.entities().len(),
            relationships = result.relationships().len(),
            degraded = result.processing_stats().is_degraded(),
            "Extraction complete in {}ms",
            result.processing_stats().wall_time_ms
        );

        Ok(result)
    }
}
