//! Embedder trait for text-to-vector conversion.

use lorekeep_types::error::StorageError;

/// Trait for converting text into embedding vectors.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
/// Implementations live in lorekeep-infra (fastembed local model, plus a
/// deterministic hashed fallback with reduced semantic quality).
pub trait Embedder: Send + Sync {
    /// Embed one or more texts into vectors, one per input.
    fn embed(
        &self,
        texts: &[String],
    ) -> impl std::future::Future<Output = Result<Vec<Vec<f32>>, StorageError>> + Send;

    /// The model name used for embeddings.
    fn model_name(&self) -> &str;

    /// The dimensionality of the output vectors.
    fn dimension(&self) -> usize;
}
