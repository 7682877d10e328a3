//! LlmProvider trait definition.
//!
//! The core abstraction all LLM providers implement. The pipeline is
//! strictly request/response -- each completion blocks the caller -- so the
//! trait surface is `complete` only.

use lorekeep_types::llm::{CompletionRequest, CompletionResponse, LlmError};

/// Trait for LLM provider backends.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
/// Implementations live in lorekeep-infra (e.g., `GroqProvider`).
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "groq").
    fn name(&self) -> &str;

    /// The default model used when a request leaves `model` empty.
    fn model(&self) -> &str;

    /// Send a completion request and receive the full response.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send;
}
