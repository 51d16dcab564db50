//! Wave execution across chunks
//!
//! The orchestrator turns a routing decision into a [`TaskGraph`] of
//! (chunk, wave) units and runs ready units on a [`JoinSet`], with a
//! [`Semaphore`] capping in-flight backend calls. Only the scheduling loop
//! touches the result slots, so no lock is ever held across a backend call.

use crate::budget::TokenBudgetEstimator;
use crate::config::{ExtractorConfig, RetryPolicy};
use crate::error::{ExtractorError, UnitError};
use crate::parser::parse_wave_response;
use crate::prompt::{output_schema, PromptBuilder};
use crate::schedule::{ResultSlots, TaskGraph, UnitId, UnitOutcome};
use gleaner_domain::traits::{
    CompletionBackend, CompletionRequest, CompletionResponse, PatternExample,
    PatternExampleProvider,
};
use gleaner_domain::{
    CandidateEntity, Chunk, ChunkId, Document, EntityType, ProcessingStats, RawWaveResult,
    RoutingDecision, TokenUsage, UnitFailure, Wave,
};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Cancels a document in flight
///
/// Clones share the same signal. Cancelling marks every unit that has not
/// completed as cancelled; whatever already completed is still returned.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    sender: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    /// Create a handle that is not cancelled
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    /// True once cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.sender.subscribe()
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Raw results of every successful unit, plus execution statistics
#[derive(Debug, Clone)]
pub struct OrchestrationOutcome {
    /// Successful unit results, in (chunk, wave) order
    pub results: Vec<RawWaveResult>,
    /// Execution statistics (reconciliation counters still zero)
    pub stats: ProcessingStats,
}

/// Executes the waves of a routing decision
pub struct WaveOrchestrator<B, P> {
    backend: Arc<B>,
    patterns: Arc<P>,
    config: Arc<ExtractorConfig>,
    estimator: TokenBudgetEstimator,
}

impl<B, P> WaveOrchestrator<B, P>
where
    B: CompletionBackend + Send + Sync + 'static,
    B::Error: fmt::Display,
    P: PatternExampleProvider + Send + Sync,
{
    /// Create a new orchestrator
    pub fn new(backend: Arc<B>, patterns: Arc<P>, config: Arc<ExtractorConfig>) -> Self {
        let estimator = TokenBudgetEstimator::from_config(&config.budget);
        Self {
            backend,
            patterns,
            config,
            estimator,
        }
    }

    /// Execute every (chunk, wave) unit of `decision`
    pub async fn run(
        &self,
        decision: &RoutingDecision,
        document: &Document,
    ) -> Result<OrchestrationOutcome, ExtractorError> {
        self.run_with_cancel(decision, document, &CancelHandle::new())
            .await
    }

    /// Execute every unit, stopping early if `cancel` fires or the document deadline passes
    ///
    /// Unit failures are recorded in the stats. The only error besides an
    /// inconsistent wave plan is [`ExtractorError::DocumentFailure`], returned
    /// when no entity wave completed on any chunk.
    pub async fn run_with_cancel(
        &self,
        decision: &RoutingDecision,
        document: &Document,
        cancel: &CancelHandle,
    ) -> Result<OrchestrationOutcome, ExtractorError> {
        let waves = decision.expected_waves();
        let mut stats = ProcessingStats::new();
        stats.strategy = Some(decision.strategy());

        if waves.is_empty() {
            debug!(document = %document.id(), "No waves to run");
            return Ok(OrchestrationOutcome {
                results: Vec::new(),
                stats,
            });
        }

        let chunks = match decision.chunk_plan() {
            Some(plan) => plan.chunks.clone(),
            None => vec![Chunk::whole(document.text())],
        };

        let graph = TaskGraph::build(&chunks, waves)?;
        stats.units_total = graph.len();

        info!(
            document = %document.id(),
            strategy = %decision.strategy(),
            chunks = chunks.len(),
            units = graph.len(),
            model = self.backend.model_name(),
            "Starting wave execution"
        );

        let mut execution = Execution {
            orchestrator: self,
            waves: waves.iter().map(|w| (w.ordinal, w)).collect(),
            chunks: chunks.iter().map(|c| (c.chunk_id, c)).collect(),
            ready: graph.initial_ready().into(),
            graph,
            slots: ResultSlots::new(),
            stats,
            tasks: JoinSet::new(),
            prompt_estimates: BTreeMap::new(),
            semaphore: Arc::new(Semaphore::new(self.config.orchestrator.max_concurrency)),
        };

        let cancelled = execution
            .drive(cancel, self.config.orchestrator.document_deadline())
            .await;
        let (results, stats) = execution.finish(cancelled).await;

        let entity_waves: BTreeSet<u8> = waves
            .iter()
            .filter(|w| !w.is_relationship_wave())
            .map(|w| w.ordinal)
            .collect();
        let any_entity_wave_done = results
            .iter()
            .any(|r| entity_waves.contains(&r.wave_ordinal));
        if !any_entity_wave_done {
            error!(
                document = %document.id(),
                failed = stats.units_failed,
                cancelled = stats.units_cancelled,
                "No entity wave completed on any chunk"
            );
            return Err(ExtractorError::DocumentFailure {
                failed_units: stats.units_failed + stats.units_cancelled,
                chunks: chunks.len(),
            });
        }

        info!(
            document = %document.id(),
            succeeded = stats.units_succeeded,
            failed = stats.units_failed,
            skipped = stats.units_skipped,
            cancelled = stats.units_cancelled,
            retries = stats.retries,
            "Wave execution complete"
        );

        Ok(OrchestrationOutcome { results, stats })
    }

    /// Few-shot examples for a wave, capped per entity type
    fn examples_for(&self, wave: &Wave) -> Vec<PatternExample> {
        if wave.target_types.is_empty() {
            return Vec::new();
        }

        let types: BTreeSet<EntityType> = wave.target_types.iter().copied().collect();
        let limit = self.config.orchestrator.examples_per_type;
        let mut per_type: BTreeMap<EntityType, usize> = BTreeMap::new();

        self.patterns
            .lookup(&types)
            .into_iter()
            .filter(|example| {
                let seen = per_type.entry(example.entity_type).or_default();
                *seen += 1;
                *seen <= limit
            })
            .collect()
    }
}

/// What a unit task hands back to the scheduling loop
struct UnitReport {
    unit: UnitId,
    outcome: Result<CompletionResponse, UnitError>,
    retries: u32,
}

/// State of one document run, owned by the scheduling loop
struct Execution<'a, B, P> {
    orchestrator: &'a WaveOrchestrator<B, P>,
    waves: BTreeMap<u8, &'a Wave>,
    chunks: BTreeMap<ChunkId, &'a Chunk>,
    graph: TaskGraph,
    ready: VecDeque<UnitId>,
    slots: ResultSlots,
    stats: ProcessingStats,
    tasks: JoinSet<UnitReport>,
    prompt_estimates: BTreeMap<UnitId, usize>,
    semaphore: Arc<Semaphore>,
}

impl<B, P> Execution<'_, B, P>
where
    B: CompletionBackend + Send + Sync + 'static,
    B::Error: fmt::Display,
    P: PatternExampleProvider + Send + Sync,
{
    /// Run until every unit is resolved or the run is cancelled; returns true if cancelled
    async fn drive(&mut self, cancel: &CancelHandle, deadline: Option<Duration>) -> bool {
        let cancel_signal = wait_for_cancel(cancel.subscribe());
        tokio::pin!(cancel_signal);

        let deadline_signal = async move {
            match deadline {
                Some(limit) => tokio::time::sleep(limit).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(deadline_signal);

        if cancel.is_cancelled() {
            return true;
        }

        loop {
            while let Some(unit) = self.ready.pop_front() {
                self.dispatch(unit);
            }

            if self.tasks.is_empty() {
                return false;
            }

            tokio::select! {
                _ = &mut cancel_signal => {
                    warn!("Cancellation requested, aborting in-flight units");
                    return true;
                }
                _ = &mut deadline_signal => {
                    warn!("Document deadline reached, aborting in-flight units");
                    return true;
                }
                Some(joined) = self.tasks.join_next() => match joined {
                    Ok(report) => self.complete(report),
                    Err(e) => error!("Unit task ended abnormally: {}", e),
                },
            }
        }
    }

    /// Prepare a ready unit: skip it, fail it locally, or spawn its backend call
    fn dispatch(&mut self, unit: UnitId) {
        let (Some(wave), Some(chunk)) = (
            self.waves.get(&unit.wave).copied(),
            self.chunks.get(&unit.chunk).copied(),
        ) else {
            self.record(unit, UnitOutcome::Failed(UnitError::Backend(format!("unknown unit {}", unit))));
            return;
        };

        let dependencies = self.graph.dependencies(unit).to_vec();
        let known: Vec<&CandidateEntity> = dependencies
            .iter()
            .flat_map(|dep| self.slots.entities(*dep))
            .collect();

        if wave.is_relationship_wave() && known.is_empty() {
            debug!(unit = %unit, "Skipping relationship wave: no entities to relate");
            self.record(unit, UnitOutcome::Skipped);
            return;
        }

        let orchestrator = self.orchestrator;
        let prompt = PromptBuilder::new(wave, chunk)
            .with_examples(orchestrator.examples_for(wave))
            .with_known_entities(known)
            .build();

        let estimated = orchestrator.estimator.estimate(&prompt);
        let budget = orchestrator.config.budget.prompt_budget();
        if estimated > budget {
            self.record(
                unit,
                UnitOutcome::Failed(UnitError::PromptOverflow { estimated, budget }),
            );
            return;
        }

        let settings = &orchestrator.config.orchestrator;
        let request = CompletionRequest {
            prompt,
            schema: output_schema(wave),
            max_output_tokens: settings.max_output_tokens,
            temperature: settings.temperature,
            seed: settings.seed,
        };

        debug!(unit = %unit, wave = %wave.name, estimated_tokens = estimated, "Dispatching unit");
        self.prompt_estimates.insert(unit, estimated);
        self.tasks.spawn(execute_unit(
            unit,
            Arc::clone(&orchestrator.backend),
            Arc::clone(&self.semaphore),
            request,
            settings.unit_timeout(),
            settings.retry.clone(),
        ));
    }

    /// Handle a finished unit task
    fn complete(&mut self, report: UnitReport) {
        let UnitReport {
            unit,
            outcome,
            retries,
        } = report;
        self.stats.retries += retries as usize;
        let estimated_prompt = self.prompt_estimates.remove(&unit).unwrap_or(0);

        let outcome = match outcome {
            Ok(response) => {
                let estimator = &self.orchestrator.estimator;
                let usage = response.usage.unwrap_or_else(|| {
                    TokenUsage::new(
                        estimated_prompt as u64,
                        estimator.estimate(&response.text) as u64,
                    )
                });
                self.stats.token_usage.add(usage);

                match (self.waves.get(&unit.wave), self.chunks.get(&unit.chunk)) {
                    (Some(wave), Some(chunk)) => {
                        match parse_wave_response(&response.text, wave, chunk) {
                            Ok(mut result) => {
                                result.token_usage = usage;
                                UnitOutcome::Succeeded(result)
                            }
                            Err(e) => UnitOutcome::Failed(e),
                        }
                    }
                    _ => UnitOutcome::Failed(UnitError::Backend(format!("unknown unit {}", unit))),
                }
            }
            Err(e) => UnitOutcome::Failed(e),
        };

        self.record(unit, outcome);
    }

    /// Store an outcome, update the stats and release dependents
    fn record(&mut self, unit: UnitId, outcome: UnitOutcome) {
        match &outcome {
            UnitOutcome::Succeeded(result) => {
                debug!(
                    unit = %unit,
                    entities = result.entities.len(),
                    relationships = result.relationships.len(),
                    discarded = result.discarded,
                    "Unit succeeded"
                );
                self.stats.units_succeeded += 1;
                self.stats.items_discarded += result.discarded;
            }
            UnitOutcome::Failed(e) => {
                if *e == UnitError::Cancelled {
                    debug!(unit = %unit, "Unit cancelled");
                } else {
                    warn!(unit = %unit, "Unit failed: {}", e);
                }
                self.stats.record_failure(UnitFailure {
                    chunk_id: unit.chunk,
                    wave_ordinal: unit.wave,
                    kind: e.kind(),
                    message: e.to_string(),
                });
            }
            UnitOutcome::Skipped => self.stats.units_skipped += 1,
        }

        if self.slots.fill(unit, outcome) {
            let newly_ready = self.graph.resolve(unit);
            self.ready.extend(newly_ready);
        }
    }

    /// Settle in-flight and unstarted units, then hand back results and stats
    async fn finish(mut self, cancelled: bool) -> (Vec<RawWaveResult>, ProcessingStats) {
        if cancelled {
            self.tasks.abort_all();
            // Units that finished before the abort still count
            while let Some(joined) = self.tasks.join_next().await {
                if let Ok(report) = joined {
                    self.complete(report);
                }
            }
            self.ready.clear();
        }

        for unit in self.graph.unresolved() {
            let error = if cancelled {
                UnitError::Cancelled
            } else {
                UnitError::Backend("unit task ended before reporting".to_string())
            };
            self.record(unit, UnitOutcome::Failed(error));
        }
        self.ready.clear();

        let succeeded: Vec<UnitId> = self
            .slots
            .iter()
            .filter(|(_, outcome)| matches!(outcome, UnitOutcome::Succeeded(_)))
            .map(|(unit, _)| *unit)
            .collect();
        self.stats.waves_executed = succeeded.iter().map(|u| u.wave).collect::<BTreeSet<_>>().len();
        self.stats.chunks_processed = succeeded.iter().map(|u| u.chunk).collect::<BTreeSet<_>>().len();

        (self.slots.into_results(), self.stats)
    }
}

/// Run one unit's backend call, retrying per policy
async fn execute_unit<B>(
    unit: UnitId,
    backend: Arc<B>,
    semaphore: Arc<Semaphore>,
    request: CompletionRequest,
    timeout: Duration,
    retry: RetryPolicy,
) -> UnitReport
where
    B: CompletionBackend + Send + Sync + 'static,
    B::Error: fmt::Display,
{
    let request = Arc::new(request);
    let mut retries = 0;

    loop {
        match call_backend(&backend, &semaphore, &request, timeout).await {
            Err(e) if e.is_retryable() && retries < retry.max_retries => {
                retries += 1;
                let delay = retry.backoff(retries);
                warn!(unit = %unit, "{}; retry {} in {:?}", e, retries, delay);
                tokio::time::sleep(delay).await;
            }
            outcome => {
                return UnitReport {
                    unit,
                    outcome,
                    retries,
                }
            }
        }
    }
}

/// One backend call on the blocking pool, holding a concurrency permit
///
/// The permit is taken before the timeout starts, so time spent queueing
/// does not count against the unit. It moves into the blocking call and is
/// released only when the backend returns, even if the unit has already
/// timed out or been aborted.
async fn call_backend<B>(
    backend: &Arc<B>,
    semaphore: &Arc<Semaphore>,
    request: &Arc<CompletionRequest>,
    timeout: Duration,
) -> Result<CompletionResponse, UnitError>
where
    B: CompletionBackend + Send + Sync + 'static,
    B::Error: fmt::Display,
{
    let permit = Arc::clone(semaphore)
        .acquire_owned()
        .await
        .map_err(|_| UnitError::Cancelled)?;

    let backend = Arc::clone(backend);
    let request = Arc::clone(request);
    let call = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        backend
            .complete(&request)
            .map_err(|e| UnitError::Backend(e.to_string()))
    });

    match tokio::time::timeout(timeout, call).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => Err(UnitError::Backend(format!("Backend task failed: {}", e))),
        Err(_) => Err(UnitError::Timeout(timeout)),
    }
}

async fn wait_for_cancel(mut receiver: watch::Receiver<bool>) {
    let closed = receiver.wait_for(|cancelled| *cancelled).await.is_err();
    if closed {
        std::future::pending::<()>().await;
    }
}
