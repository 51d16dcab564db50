//! Gleaner Extractor
//!
//! Size-aware entity and relationship extraction over a language-model
//! completion backend.
//!
//! # Overview
//!
//! A document is profiled and routed to a strategy. Large documents are split
//! into overlapping chunks. Each strategy is a fixed list of waves, each wave
//! targeting part of the entity taxonomy; every (chunk, wave) pair is one unit
//! of work in an explicit task graph. Raw unit results are validated,
//! deduplicated and ranked into a single [`ReconciledResult`].
//!
//! # Architecture
//!
//! ```text
//! Document → DocumentRouter → ChunkEngine → WaveOrchestrator → EntityReconciler → ReconciledResult
//!                 │                               │
//!        TokenBudgetEstimator        CompletionBackend + PatternExampleProvider
//! ```
//!
//! # Key Features
//!
//! - **Size routing**: single pass, multi wave, or chunked multi wave by character count
//! - **Boundary-aware chunking**: paragraph, sentence, then whitespace cuts with overlap
//! - **Bounded concurrency**: a semaphore caps in-flight backend calls
//! - **Graceful degradation**: unit failures are recorded, not propagated
//! - **Deterministic output**: reconciliation ignores execution order
//!
//! # Example Usage
//!
//! ```no_run
//! use gleaner_extractor::{ExtractionPipeline, ExtractorConfig};
//! use gleaner_domain::Document;
//! use gleaner_llm::MockProvider;
//! use gleaner_patterns::PatternLibrary;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = MockProvider::new(
//!     r#"{"entities": [{"type": "person", "text": "Alice", "confidence": 0.9}]}"#,
//! );
//! let pipeline = ExtractionPipeline::new(
//!     backend,
//!     PatternLibrary::builtin(),
//!     ExtractorConfig::default(),
//! )?;
//!
//! let result = pipeline
//!     .extract(&Document::new("Alice works at Acme Corp."), None)
//!     .await?;
//!
//! println!("Entities: {}", result.entities().len());
//! println!("{}", result.processing_stats().summary());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod budget;
mod chunking;
mod config;
mod error;
mod orchestrator;
mod parser;
mod pipeline;
mod prompt;
mod reconciler;
mod router;
mod schedule;
mod waves;

pub use budget::TokenBudgetEstimator;
pub use chunking::ChunkEngine;
pub use config::{
    BudgetConfig, ChunkSizing, ChunkingConfig, ExtractorConfig, OrchestratorConfig, RetryPolicy,
    RoutingConfig,
};
pub use error::{ChunkError, ExtractorError, UnitError};
pub use orchestrator::{CancelHandle, OrchestrationOutcome, WaveOrchestrator};
pub use parser::parse_wave_response;
pub use pipeline::ExtractionPipeline;
pub use prompt::{output_schema, PromptBuilder};
pub use reconciler::EntityReconciler;
pub use router::DocumentRouter;
pub use schedule::{ResultSlots, TaskGraph, UnitId, UnitOutcome};
pub use waves::{waves_for, CORE_ENTITIES, LEGAL_REFERENCES, SUPPLEMENTARY, TEMPORAL_FINANCIAL};

pub use gleaner_domain::ReconciledResult;
