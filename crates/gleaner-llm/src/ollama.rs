//! Ollama Provider Implementation
//!
//! Provides integration with Ollama's local LLM API.
//!
//! # Features
//!
//! - Structured output through Ollama's `format` field (JSON Schema)
//! - Deterministic sampling via temperature and seed options
//! - Configurable endpoint, model and HTTP timeout
//!
//! Retries are deliberately absent here; the orchestrator applies the
//! caller's retry policy around every backend call.
//!
//! # Examples
//!
//! ```no_run
//! use gleaner_llm::OllamaProvider;
//!
//! let provider = OllamaProvider::new("http://localhost:11434", "llama3").unwrap();
//! ```

use crate::LlmError;
use gleaner_domain::traits::{CompletionBackend, CompletionRequest, CompletionResponse};
use gleaner_domain::TokenUsage;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Default Ollama API endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Default HTTP timeout for LLM requests (seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Ollama API provider for local LLM inference
pub struct OllamaProvider {
    endpoint: String,
    model: String,
    client: reqwest::blocking::Client,
}

/// Request body for Ollama generate API
#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    format: serde_json::Value,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
    num_predict: u32,
}

/// Response from Ollama generate API
#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
    #[serde(default)]
    prompt_eval_count: Option<u64>,
    #[serde(default)]
    eval_count: Option<u64>,
}

impl OllamaProvider {
    /// Create a new Ollama provider
    ///
    /// # Parameters
    ///
    /// - `endpoint`: Ollama API endpoint (e.g., "http://localhost:11434")
    /// - `model`: Model to use (e.g., "llama3", "mistral")
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Result<Self, LlmError> {
        Self::with_timeout(endpoint, model, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a provider with a custom HTTP timeout
    pub fn with_timeout(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Communication(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            client,
        })
    }

    /// Create a new Ollama provider on the default endpoint
    pub fn default_endpoint(model: impl Into<String>) -> Result<Self, LlmError> {
        Self::new(DEFAULT_ENDPOINT, model)
    }

    /// Endpoint this provider talks to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn format_for(schema: &str) -> serde_json::Value {
        serde_json::from_str(schema).unwrap_or_else(|_| serde_json::Value::String("json".to_string()))
    }
}

impl CompletionBackend for OllamaProvider {
    type Error = LlmError;

    fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, Self::Error> {
        let url = format!("{}/api/generate", self.endpoint);

        let body = OllamaGenerateRequest {
            model: &self.model,
            prompt: &request.prompt,
            stream: false,
            format: Self::format_for(&request.schema),
            options: OllamaOptions {
                temperature: request.temperature,
                seed: request.seed,
                num_predict: request.max_output_tokens,
            },
        };

        debug!("POST {} ({} prompt chars)", url, request.prompt.len());

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| LlmError::Communication(format!("Request failed: {}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(LlmError::ModelNotAvailable(self.model.clone()));
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::RateLimitExceeded);
        }
        if !status.is_success() {
            let error_text = response
                .text()
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LlmError::Communication(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let parsed: OllamaGenerateResponse = response
            .json()
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        let usage = match (parsed.prompt_eval_count, parsed.eval_count) {
            (Some(prompt), Some(completion)) => Some(TokenUsage::new(prompt, completion)),
            _ => None,
        };

        Ok(CompletionResponse {
            text: parsed.response,
            usage,
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ollama_provider_creation() {
        let provider = OllamaProvider::new("http://localhost:11434/", "llama3").unwrap();
        assert_eq!(provider.endpoint(), "http://localhost:11434");
        assert_eq!(provider.model_name(), "llama3");
    }

    #[test]
    fn test_ollama_provider_default_endpoint() {
        let provider = OllamaProvider::default_endpoint("mistral").unwrap();
        assert_eq!(provider.endpoint(), DEFAULT_ENDPOINT);
        assert_eq!(provider.model_name(), "mistral");
    }

    #[test]
    fn test_format_uses_schema_when_valid() {
        let format = OllamaProvider::format_for(r#"{"type": "object"}"#);
        assert_eq!(format["type"], "object");

        let fallback = OllamaProvider::format_for("not json");
        assert_eq!(fallback, serde_json::Value::String("json".to_string()));
    }

    #[test]
    fn test_request_body_shape() {
        let body = OllamaGenerateRequest {
            model: "llama3",
            prompt: "p",
            stream: false,
            format: serde_json::json!({"type": "object"}),
            options: OllamaOptions {
                temperature: 0.0,
                seed: None,
                num_predict: 256,
            },
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["stream"], false);
        assert_eq!(value["options"]["num_predict"], 256);
        assert!(value["options"].get("seed").is_none());
    }

    #[test]
    fn test_ollama_error_handling() {
        // Invalid port triggers a communication error before any network I/O
        let provider = OllamaProvider::new("http://localhost:99999", "llama3").unwrap();
        let request = CompletionRequest {
            prompt: "test".to_string(),
            schema: "{}".to_string(),
            max_output_tokens: 8,
            temperature: 0.0,
            seed: None,
        };

        match provider.complete(&request) {
            Err(LlmError::Communication(_)) => {}
            other => panic!("Expected Communication error, got {:?}", other.map(|r| r.text)),
        }
    }

    // Integration test (requires running Ollama)
    #[test]
    #[ignore]
    fn test_ollama_complete_integration() {
        let provider = OllamaProvider::default_endpoint("llama3").unwrap();
        let request = CompletionRequest {
            prompt: "Return {\"entities\": []}".to_string(),
            schema: r#"{"type": "object"}"#.to_string(),
            max_output_tokens: 32,
            temperature: 0.0,
            seed: Some(1),
        };
        if let Ok(response) = provider.complete(&request) {
            assert!(!response.text.is_empty());
        }
    }
}
