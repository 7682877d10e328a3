//! BoxLlmProvider -- object-safe dynamic dispatch wrapper for LlmProvider.
//!
//! Pattern:
//! 1. Define an object-safe `LlmProviderDyn` trait with boxed futures
//! 2. Blanket-impl `LlmProviderDyn` for all `T: LlmProvider`
//! 3. `BoxLlmProvider` wraps `Box<dyn LlmProviderDyn>` and delegates

use std::future::Future;
use std::pin::Pin;

use lorekeep_types::llm::{CompletionRequest, CompletionResponse, LlmError};

use super::provider::LlmProvider;

/// Object-safe version of [`LlmProvider`] with boxed futures.
///
/// Exists solely to enable dynamic dispatch; a blanket implementation
/// covers every `LlmProvider`.
pub trait LlmProviderDyn: Send + Sync {
    fn complete_boxed<'a>(
        &'a self,
        request: &'a CompletionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<CompletionResponse, LlmError>> + Send + 'a>>;

    fn name_dyn(&self) -> &str;

    fn model_dyn(&self) -> &str;
}

impl<T: LlmProvider> LlmProviderDyn for T {
    fn complete_boxed<'a>(
        &'a self,
        request: &'a CompletionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<CompletionResponse, LlmError>> + Send + 'a>> {
        Box::pin(self.complete(request))
    }

    fn name_dyn(&self) -> &str {
        self.name()
    }

    fn model_dyn(&self) -> &str {
        self.model()
    }
}

/// Type-erased LLM provider for runtime selection.
///
/// Since `LlmProvider` uses RPITIT it cannot be a trait object directly;
/// `BoxLlmProvider` provides equivalent methods delegating to the inner
/// `LlmProviderDyn` trait object.
pub struct BoxLlmProvider {
    inner: Box<dyn LlmProviderDyn + Send + Sync>,
}

impl BoxLlmProvider {
    /// Wrap a concrete `LlmProvider` in a type-erased box.
    pub fn new<T: LlmProvider + 'static>(provider: T) -> Self {
        Self { inner: Box::new(provider) }
    }

    /// Send a completion request and receive the full response.
    pub async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.inner.complete_boxed(request).await
    }

    /// Human-readable provider name.
    pub fn name(&self) -> &str {
        self.inner.name_dyn()
    }

    /// The provider's default model.
    pub fn model(&self) -> &str {
        self.inner.model_dyn()
    }
}
