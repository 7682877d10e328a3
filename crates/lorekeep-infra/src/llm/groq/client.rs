//! GroqProvider -- concrete [`LlmProvider`] implementation for Groq's
//! OpenAI-compatible chat completions endpoint.
//!
//! The API key is wrapped in [`secrecy::SecretString`] and only exposed when
//! constructing the Authorization header; it never appears in Debug output
//! or tracing logs.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use lorekeep_core::llm::provider::LlmProvider;
use lorekeep_types::llm::{CompletionRequest, CompletionResponse, LlmError, Usage};

use super::types::{GroqChatRequest, GroqChatResponse, GroqMessage};

const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Groq LLM provider.
pub struct GroqProvider {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
}

// GroqProvider intentionally does not derive Debug: the SecretString field
// already guards the key, omitting Debug removes the temptation entirely.

impl GroqProvider {
    /// Create a new provider.
    ///
    /// * `api_key` - Groq API key wrapped in SecretString
    /// * `model` - default model identifier (e.g. "llama-3.1-8b-instant")
    pub fn new(api_key: SecretString, model: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .expect("failed to create reqwest client");

        Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model,
        }
    }

    /// Override the base URL (for testing or proxies).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn to_wire_request(&self, request: &CompletionRequest) -> GroqChatRequest {
        let model = if request.model.is_empty() {
            self.model.clone()
        } else {
            request.model.clone()
        };
        GroqChatRequest {
            model,
            messages: request
                .messages
                .iter()
                .map(|m| GroqMessage { role: m.role.to_string(), content: m.content.clone() })
                .collect(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }
}

impl LlmProvider for GroqProvider {
    fn name(&self) -> &str {
        "groq"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = self.to_wire_request(request);
        let url = self.url("/chat/completions");

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Provider { message: format!("HTTP request failed: {e}") })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after_ms = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(|secs| secs * 1000);
            let error_body = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 | 403 => LlmError::AuthenticationFailed,
                429 => LlmError::RateLimited { retry_after_ms },
                400 | 422 => LlmError::InvalidRequest(error_body),
                503 | 529 => LlmError::Overloaded(error_body),
                _ => LlmError::Provider { message: format!("HTTP {status}: {error_body}") },
            });
        }

        let wire: GroqChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Deserialization(format!("failed to parse response: {e}")))?;

        let content = wire
            .choices
            .first()
            .map(|choice| choice.message.content.clone())
            .ok_or_else(|| LlmError::Deserialization("response contained no choices".into()))?;

        let usage = wire.usage.unwrap_or_default();
        tracing::debug!(
            model = %wire.model,
            total_tokens = usage.total_tokens,
            "completion received"
        );

        Ok(CompletionResponse {
            id: wire.id,
            content,
            model: wire.model,
            usage: Usage {
                prompt_tokens: usage.prompt_tokens,
                completion_tokens: usage.completion_tokens,
                total_tokens: usage.total_tokens,
            },
        })
    }
}
