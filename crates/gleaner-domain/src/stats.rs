//! Processing statistics reported alongside every result

use crate::chunk::ChunkId;
use crate::entity::TokenUsage;
use crate::routing::Strategy;

/// Category of a failed (chunk, wave) unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Composed prompt exceeded the token budget
    PromptOverflow,
    /// Backend returned an error or was unreachable
    Backend,
    /// Backend did not answer within the unit timeout
    Timeout,
    /// Response did not conform to the output schema
    SchemaViolation,
    /// Unit was cancelled before completing
    Cancelled,
}

impl FailureKind {
    /// Get the kind name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::PromptOverflow => "prompt_overflow",
            FailureKind::Backend => "backend_error",
            FailureKind::Timeout => "timeout",
            FailureKind::SchemaViolation => "schema_violation",
            FailureKind::Cancelled => "cancelled",
        }
    }
}

/// A (chunk, wave) unit that contributed nothing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitFailure {
    /// Chunk of the failed unit
    pub chunk_id: ChunkId,
    /// Wave of the failed unit
    pub wave_ordinal: u8,
    /// Failure category
    pub kind: FailureKind,
    /// Error detail
    pub message: String,
}

/// Counters describing how a document was processed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessingStats {
    /// Strategy that was executed
    pub strategy: Option<Strategy>,
    /// Distinct waves with at least one successful unit
    pub waves_executed: usize,
    /// Distinct chunks with at least one successful unit
    pub chunks_processed: usize,
    /// Units scheduled
    pub units_total: usize,
    /// Units that produced a result
    pub units_succeeded: usize,
    /// Units that failed (excluding cancellations)
    pub units_failed: usize,
    /// Dependent units skipped because their dependencies found nothing
    pub units_skipped: usize,
    /// Units cancelled by deadline or caller
    pub units_cancelled: usize,
    /// Backend retries performed
    pub retries: usize,
    /// Per-unit failure details (failed and cancelled units)
    pub failures: Vec<UnitFailure>,
    /// Items dropped at the schema boundary
    pub items_discarded: usize,
    /// Entities rejected by validation
    pub entities_rejected: usize,
    /// Relationships rejected by validation
    pub relationships_rejected: usize,
    /// Candidates folded into an existing entity or relationship
    pub duplicates_merged: usize,
    /// Total token usage
    pub token_usage: TokenUsage,
    /// Wall time in milliseconds
    pub wall_time_ms: u64,
}

impl ProcessingStats {
    /// Create empty stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a unit failure; cancellations are counted separately
    pub fn record_failure(&mut self, failure: UnitFailure) {
        if failure.kind == FailureKind::Cancelled {
            self.units_cancelled += 1;
        } else {
            self.units_failed += 1;
        }
        self.failures.push(failure);
    }

    /// Total tokens consumed
    pub fn total_tokens(&self) -> u64 {
        self.token_usage.total()
    }

    /// Count of failures of a given kind
    pub fn failures_of(&self, kind: FailureKind) -> usize {
        self.failures.iter().filter(|f| f.kind == kind).count()
    }

    /// True if any unit failed, was cancelled, or any item was dropped
    pub fn is_degraded(&self) -> bool {
        self.units_failed > 0
            || self.units_cancelled > 0
            || self.items_discarded > 0
            || self.entities_rejected > 0
            || self.relationships_rejected > 0
    }

    /// Generate a summary report
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Processing Summary".to_string(),
            "==================".to_string(),
            format!(
                "Strategy: {}",
                self.strategy.map_or("none", |s| s.as_str())
            ),
            format!("Waves executed: {}", self.waves_executed),
            format!("Chunks processed: {}", self.chunks_processed),
            format!(
                "Units: {} total, {} succeeded, {} failed, {} skipped, {} cancelled",
                self.units_total,
                self.units_succeeded,
                self.units_failed,
                self.units_skipped,
                self.units_cancelled
            ),
            format!("Retries: {}", self.retries),
            format!(
                "Dropped: {} at schema, {} entities rejected, {} relationships rejected",
                self.items_discarded, self.entities_rejected, self.relationships_rejected
            ),
            format!("Duplicates merged: {}", self.duplicates_merged),
            format!(
                "Tokens: {} prompt, {} completion",
                self.token_usage.prompt_tokens, self.token_usage.completion_tokens
            ),
            format!("Wall time: {}ms", self.wall_time_ms),
        ];

        if !self.failures.is_empty() {
            lines.push(String::new());
            lines.push("Failed units:".to_string());
            for failure in &self.failures {
                lines.push(format!(
                    "  {} wave {}: {} ({})",
                    failure.chunk_id,
                    failure.wave_ordinal,
                    failure.kind.as_str(),
                    failure.message
                ));
            }
        }

        lines.join("\n")
    }
}
