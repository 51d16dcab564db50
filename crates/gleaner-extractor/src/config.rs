//! Configuration for the extraction pipeline
//!
//! One immutable [`ExtractorConfig`] is built up front and shared (behind an
//! `Arc`) by the router, chunk engine, orchestrator and reconciler. Nothing in
//! the pipeline reads configuration from global state.

use crate::error::ExtractorError;
use gleaner_domain::SizeCategory;
use gleaner_gatekeeper::ValidationConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Size thresholds in characters
///
/// Each category covers `[lower, upper)`: a document of exactly
/// `very_small_max_chars` characters is `Small`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// First character count classified as `Small`
    pub very_small_max_chars: usize,
    /// First character count classified as `Medium`
    pub small_max_chars: usize,
    /// First character count classified as `Large`
    pub medium_max_chars: usize,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            very_small_max_chars: 5_000,
            small_max_chars: 20_000,
            medium_max_chars: 100_000,
        }
    }
}

impl RoutingConfig {
    /// Classify a character count
    pub fn categorize(&self, char_count: usize) -> SizeCategory {
        if char_count < self.very_small_max_chars {
            SizeCategory::VerySmall
        } else if char_count < self.small_max_chars {
            SizeCategory::Small
        } else if char_count < self.medium_max_chars {
            SizeCategory::Medium
        } else {
            SizeCategory::Large
        }
    }
}

/// Chunk sizing for one size category (all values in characters)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkSizing {
    /// Tentative chunk length
    pub target_size: usize,
    /// Characters shared between adjacent chunks
    pub overlap_size: usize,
    /// Smallest chunk allowed before the trailing one
    pub min_size: usize,
    /// How far back from the tentative end to look for a boundary
    pub lookback: usize,
}

impl ChunkSizing {
    fn check(&self, label: &str) -> Result<(), ExtractorError> {
        if self.target_size == 0 {
            return Err(ExtractorError::Config(format!(
                "chunking.{label}.target_size must be greater than 0"
            )));
        }
        if self.overlap_size == 0 || self.overlap_size >= self.target_size {
            return Err(ExtractorError::Config(format!(
                "chunking.{label}.overlap_size must be in 1..target_size"
            )));
        }
        if self.min_size > self.target_size {
            return Err(ExtractorError::Config(format!(
                "chunking.{label}.min_size cannot exceed target_size"
            )));
        }
        Ok(())
    }
}

/// Chunk sizing per size category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Used for medium (and promoted smaller) documents
    pub medium: ChunkSizing,
    /// Used for large documents
    pub large: ChunkSizing,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            medium: ChunkSizing {
                target_size: 12_000,
                overlap_size: 600,
                min_size: 3_000,
                lookback: 1_000,
            },
            large: ChunkSizing {
                target_size: 8_000,
                overlap_size: 500,
                min_size: 2_000,
                lookback: 800,
            },
        }
    }
}

impl ChunkingConfig {
    /// Sizing for a size category
    pub fn sizing_for(&self, category: SizeCategory) -> &ChunkSizing {
        match category {
            SizeCategory::Large => &self.large,
            _ => &self.medium,
        }
    }
}

/// Model context budget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetConfig {
    /// Model context window in tokens
    pub context_window_tokens: usize,
    /// Tokens reserved for the completion
    pub completion_reserve_tokens: usize,
    /// Characters per token assumed by the estimator (lower is more conservative)
    pub chars_per_token: f64,
    /// Tokens assumed for template and examples when routing
    pub prompt_overhead_tokens: usize,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            context_window_tokens: 8_192,
            completion_reserve_tokens: 1_024,
            chars_per_token: 3.0,
            prompt_overhead_tokens: 600,
        }
    }
}

impl BudgetConfig {
    /// Tokens available for a prompt
    pub fn prompt_budget(&self) -> usize {
        self.context_window_tokens
            .saturating_sub(self.completion_reserve_tokens)
    }
}

/// Retry policy for backend errors and timeouts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_backoff_ms: u64,
    /// Factor applied to the delay after each retry
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            initial_backoff_ms: 250,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// No retries
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (1-based)
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = self.backoff_multiplier.powi(retry.saturating_sub(1) as i32);
        Duration::from_millis((self.initial_backoff_ms as f64 * factor) as u64)
    }
}

/// Orchestrator settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Maximum simultaneous backend calls
    pub max_concurrency: usize,
    /// Timeout for one backend call (seconds)
    pub unit_timeout_secs: u64,
    /// Deadline for a whole document (seconds)
    pub document_deadline_secs: Option<u64>,
    /// Maximum completion tokens requested per call
    pub max_output_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Determinism seed passed to the backend
    pub seed: Option<u64>,
    /// Few-shot examples per target entity type
    pub examples_per_type: usize,
    /// Retry policy
    pub retry: RetryPolicy,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            unit_timeout_secs: 120,
            document_deadline_secs: None,
            max_output_tokens: 1_024,
            temperature: 0.0,
            seed: None,
            examples_per_type: 2,
            retry: RetryPolicy::default(),
        }
    }
}

impl OrchestratorConfig {
    /// Get the unit timeout as a Duration
    pub fn unit_timeout(&self) -> Duration {
        Duration::from_secs(self.unit_timeout_secs)
    }

    /// Get the document deadline as a Duration
    pub fn document_deadline(&self) -> Option<Duration> {
        self.document_deadline_secs.map(Duration::from_secs)
    }
}

/// Configuration for the extraction pipeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Size thresholds
    pub routing: RoutingConfig,
    /// Chunk sizing
    pub chunking: ChunkingConfig,
    /// Context budget
    pub budget: BudgetConfig,
    /// Scheduling, timeouts and retries
    pub orchestrator: OrchestratorConfig,
    /// Candidate validation rules
    pub validation: ValidationConfig,
}

impl ExtractorConfig {
    /// Aggressive preset: smaller chunks, short timeouts, no retries
    pub fn aggressive() -> Self {
        Self {
            chunking: ChunkingConfig {
                medium: ChunkSizing {
                    target_size: 8_000,
                    overlap_size: 400,
                    min_size: 2_000,
                    lookback: 600,
                },
                large: ChunkSizing {
                    target_size: 6_000,
                    overlap_size: 300,
                    min_size: 1_500,
                    lookback: 500,
                },
            },
            orchestrator: OrchestratorConfig {
                max_concurrency: 8,
                unit_timeout_secs: 60,
                document_deadline_secs: Some(600),
                examples_per_type: 1,
                retry: RetryPolicy::none(),
                ..OrchestratorConfig::default()
            },
            validation: ValidationConfig::strict(),
            ..Self::default()
        }
    }

    /// Lenient preset: longer timeouts, more retries, permissive validation
    pub fn lenient() -> Self {
        Self {
            orchestrator: OrchestratorConfig {
                max_concurrency: 2,
                unit_timeout_secs: 300,
                examples_per_type: 3,
                retry: RetryPolicy {
                    max_retries: 3,
                    initial_backoff_ms: 500,
                    backoff_multiplier: 2.0,
                },
                ..OrchestratorConfig::default()
            },
            validation: ValidationConfig::permissive(),
            ..Self::default()
        }
    }

    /// Look up a preset by name
    pub fn preset(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "default" => Some(Self::default()),
            "aggressive" => Some(Self::aggressive()),
            "lenient" => Some(Self::lenient()),
            _ => None,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ExtractorError> {
        let routing = &self.routing;
        if routing.very_small_max_chars == 0
            || routing.very_small_max_chars >= routing.small_max_chars
            || routing.small_max_chars >= routing.medium_max_chars
        {
            return Err(ExtractorError::Config(
                "routing thresholds must be positive and strictly increasing".to_string(),
            ));
        }

        self.chunking.medium.check("medium")?;
        self.chunking.large.check("large")?;

        let budget = &self.budget;
        if budget.completion_reserve_tokens >= budget.context_window_tokens {
            return Err(ExtractorError::Config(
                "completion_reserve_tokens must be smaller than context_window_tokens".to_string(),
            ));
        }
        if !budget.chars_per_token.is_finite() || budget.chars_per_token <= 0.0 {
            return Err(ExtractorError::Config(
                "chars_per_token must be a positive number".to_string(),
            ));
        }

        let orchestrator = &self.orchestrator;
        if orchestrator.max_concurrency == 0 {
            return Err(ExtractorError::Config(
                "max_concurrency must be greater than 0".to_string(),
            ));
        }
        if orchestrator.unit_timeout_secs == 0 {
            return Err(ExtractorError::Config(
                "unit_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if orchestrator.document_deadline_secs == Some(0) {
            return Err(ExtractorError::Config(
                "document_deadline_secs must be greater than 0 when set".to_string(),
            ));
        }
        if orchestrator.max_output_tokens == 0 {
            return Err(ExtractorError::Config(
                "max_output_tokens must be greater than 0".to_string(),
            ));
        }
        if !orchestrator.retry.backoff_multiplier.is_finite()
            || orchestrator.retry.backoff_multiplier < 1.0
        {
            return Err(ExtractorError::Config(
                "retry.backoff_multiplier must be at least 1.0".to_string(),
            ));
        }

        self.validation
            .validate()
            .map_err(|e| ExtractorError::Config(e.to_string()))
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ExtractorError> {
        toml::from_str(toml_str)
            .map_err(|e| ExtractorError::Config(format!("Failed to parse TOML: {}", e)))
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ExtractorError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ExtractorError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&contents)
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, ExtractorError> {
        toml::to_string_pretty(self)
            .map_err(|e| ExtractorError::Config(format!("Failed to serialize to TOML: {}", e)))
    }
}
