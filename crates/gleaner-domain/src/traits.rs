//! Trait definitions for external collaborators
//!
//! These traits define the boundaries between the extraction core and
//! infrastructure. Implementations live in other crates (gleaner-llm,
//! gleaner-patterns) or in the embedding application.

use crate::entity::TokenUsage;
use crate::taxonomy::EntityType;
use std::collections::BTreeSet;

/// A request to the completion backend
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Full prompt text
    pub prompt: String,
    /// JSON Schema the response must conform to
    pub schema: String,
    /// Maximum tokens the backend may generate
    pub max_output_tokens: u32,
    /// Sampling temperature (0.0 for deterministic output)
    pub temperature: f32,
    /// Optional seed for reproducible sampling
    pub seed: Option<u64>,
}

/// A response from the completion backend
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResponse {
    /// Raw response text (expected to be JSON matching the schema)
    pub text: String,
    /// Token usage, when the backend reports it
    pub usage: Option<TokenUsage>,
}

impl CompletionResponse {
    /// Response without usage information
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            usage: None,
        }
    }
}

/// Trait for the language-model completion backend
///
/// Calls are synchronous; the orchestrator runs them on a blocking thread
/// pool under a timeout. Implemented by the infrastructure layer (gleaner-llm).
pub trait CompletionBackend {
    /// Error type for backend operations
    type Error;

    /// Generate a structured completion
    fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, Self::Error>;

    /// Name of the model behind this backend (for logging)
    fn model_name(&self) -> &str {
        "llm"
    }
}

/// A single few-shot example for one entity type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternExample {
    /// Entity type the example illustrates
    pub entity_type: EntityType,
    /// Example text
    pub example_text: String,
}

/// Read-only lookup of few-shot examples
///
/// Expected to answer from memory; the orchestrator calls it on the async
/// executor without offloading.
pub trait PatternExampleProvider {
    /// Examples for the requested types, in a deterministic order
    fn lookup(&self, entity_types: &BTreeSet<EntityType>) -> Vec<PatternExample>;
}
