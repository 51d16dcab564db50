//! Gleaner LLM Provider Layer
//!
//! Implementations of the `CompletionBackend` trait from `gleaner-domain`.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic, scriptable mock for testing
//! - `OllamaProvider`: Local Ollama API integration
//!
//! # Examples
//!
//! ```
//! use gleaner_llm::MockProvider;
//! use gleaner_domain::traits::{CompletionBackend, CompletionRequest};
//!
//! let provider = MockProvider::new(r#"{"entities": []}"#);
//! let request = CompletionRequest {
//!     prompt: "test prompt".to_string(),
//!     schema: "{}".to_string(),
//!     max_output_tokens: 64,
//!     temperature: 0.0,
//!     seed: None,
//! };
//! let response = provider.complete(&request).unwrap();
//! assert_eq!(response.text, r#"{"entities": []}"#);
//! ```

#![warn(missing_docs)]

pub mod ollama;

use gleaner_domain::traits::{CompletionBackend, CompletionRequest, CompletionResponse};
use gleaner_domain::TokenUsage;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;

pub use ollama::OllamaProvider;

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

#[derive(Debug, Clone)]
enum MockReply {
    Text(String),
    Error(String),
    Delayed(Duration, String),
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Mock completion backend for deterministic testing
///
/// Replies are chosen by marker: the first registered marker contained in
/// the prompt decides the reply, otherwise the default response is returned.
/// Clones share rules, call count and captured prompts.
///
/// # Examples
///
/// ```
/// use gleaner_llm::MockProvider;
/// use gleaner_domain::traits::{CompletionBackend, CompletionRequest};
///
/// let mut provider = MockProvider::new("default");
/// provider.add_response("invoice", "billing");
/// provider.add_error("corrupt");
///
/// let request = |prompt: &str| CompletionRequest {
///     prompt: prompt.to_string(),
///     schema: "{}".to_string(),
///     max_output_tokens: 16,
///     temperature: 0.0,
///     seed: None,
/// };
/// assert_eq!(provider.complete(&request("an invoice")).unwrap().text, "billing");
/// assert!(provider.complete(&request("corrupt data")).is_err());
/// assert_eq!(provider.complete(&request("other")).unwrap().text, "default");
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    rules: Arc<Mutex<Vec<(String, MockReply)>>>,
    call_count: Arc<Mutex<usize>>,
    prompts: Arc<Mutex<Vec<String>>>,
    usage: Option<TokenUsage>,
    model_name: String,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            rules: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
            prompts: Arc::new(Mutex::new(Vec::new())),
            usage: None,
            model_name: "mock".to_string(),
        }
    }

    /// Report this usage with every response
    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = Some(usage);
        self
    }

    /// Reply with `response` to prompts containing `marker`
    pub fn add_response(&mut self, marker: impl Into<String>, response: impl Into<String>) {
        lock(&self.rules).push((marker.into(), MockReply::Text(response.into())));
    }

    /// Fail prompts containing `marker`
    pub fn add_error(&mut self, marker: impl Into<String>) {
        lock(&self.rules).push((marker.into(), MockReply::Error("Mock error".to_string())));
    }

    /// Sleep for `delay` before replying to prompts containing `marker`
    pub fn add_delay(
        &mut self,
        marker: impl Into<String>,
        delay: Duration,
        response: impl Into<String>,
    ) {
        lock(&self.rules).push((marker.into(), MockReply::Delayed(delay, response.into())));
    }

    /// Get the number of times complete was called
    pub fn call_count(&self) -> usize {
        *lock(&self.call_count)
    }

    /// Reset the call count and captured prompts
    pub fn reset_call_count(&self) {
        *lock(&self.call_count) = 0;
        lock(&self.prompts).clear();
    }

    /// Prompts received so far, in call order
    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new(r#"{"entities": [], "relationships": []}"#)
    }
}

impl CompletionBackend for MockProvider {
    type Error = LlmError;

    fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, Self::Error> {
        *lock(&self.call_count) += 1;
        lock(&self.prompts).push(request.prompt.clone());

        let reply = lock(&self.rules)
            .iter()
            .find(|(marker, _)| request.prompt.contains(marker.as_str()))
            .map(|(_, reply)| reply.clone());

        let text = match reply {
            Some(MockReply::Text(text)) => text,
            Some(MockReply::Error(message)) => return Err(LlmError::Other(message)),
            Some(MockReply::Delayed(delay, text)) => {
                std::thread::sleep(delay);
                text
            }
            None => self.default_response.clone(),
        };

        Ok(CompletionResponse {
            text,
            usage: self.usage,
        })
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(prompt: &str) -> CompletionRequest {
        CompletionRequest {
            prompt: prompt.to_string(),
            schema: "{}".to_string(),
            max_output_tokens: 32,
            temperature: 0.0,
            seed: Some(7),
        }
    }

    #[test]
    fn test_mock_provider_default() {
        let provider = MockProvider::new("Test response");
        let result = provider.complete(&request("any prompt")).unwrap();
        assert_eq!(result.text, "Test response");
        assert_eq!(result.usage, None);
    }

    #[test]
    fn test_mock_provider_marker_responses() {
        let mut provider = MockProvider::new("fallback");
        provider.add_response("hello", "world");
        provider.add_response("foo", "bar");

        assert_eq!(provider.complete(&request("say hello")).unwrap().text, "world");
        assert_eq!(provider.complete(&request("foo!")).unwrap().text, "bar");
        assert_eq!(provider.complete(&request("unknown")).unwrap().text, "fallback");
    }

    #[test]
    fn test_first_registered_marker_wins() {
        let mut provider = MockProvider::default();
        provider.add_response("alpha", "first");
        provider.add_response("beta", "second");

        assert_eq!(provider.complete(&request("beta alpha")).unwrap().text, "first");
    }

    #[test]
    fn test_mock_provider_call_count_and_prompts() {
        let provider = MockProvider::new("test");
        assert_eq!(provider.call_count(), 0);

        provider.complete(&request("prompt1")).unwrap();
        provider.complete(&request("prompt2")).unwrap();
        assert_eq!(provider.call_count(), 2);
        assert_eq!(provider.prompts(), vec!["prompt1", "prompt2"]);

        provider.reset_call_count();
        assert_eq!(provider.call_count(), 0);
        assert!(provider.prompts().is_empty());
    }

    #[test]
    fn test_mock_provider_error() {
        let mut provider = MockProvider::default();
        provider.add_error("bad prompt");

        let result = provider.complete(&request("a bad prompt"));
        assert!(matches!(result, Err(LlmError::Other(_))));
    }

    #[test]
    fn test_mock_provider_delay() {
        let mut provider = MockProvider::default();
        provider.add_delay("slow", Duration::from_millis(20), "late");

        let start = std::time::Instant::now();
        let result = provider.complete(&request("slow one")).unwrap();
        assert_eq!(result.text, "late");
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_mock_provider_usage() {
        let provider = MockProvider::new("x").with_usage(TokenUsage::new(10, 3));
        let result = provider.complete(&request("p")).unwrap();
        assert_eq!(result.usage, Some(TokenUsage::new(10, 3)));
    }

    #[test]
    fn test_mock_provider_clone_shares_state() {
        let provider1 = MockProvider::new("test");
        let provider2 = provider1.clone();

        provider1.complete(&request("test")).unwrap();

        assert_eq!(provider1.call_count(), 1);
        assert_eq!(provider2.call_count(), 1);
    }
}
