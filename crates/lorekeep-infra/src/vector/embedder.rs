//! Embedder implementations.
//!
//! `FastembedEmbedder` runs BGESmallENV15 locally via ONNX (384 dims).
//! `HashedEmbedder` is the deterministic degradation path used when the
//! local model cannot be initialized: same dimension, token-hash vectors,
//! reduced semantic quality but stable ranking.

use std::sync::Mutex;

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

use lorekeep_core::store::embedder::Embedder;
use lorekeep_types::error::StorageError;

use super::schema::EMBEDDING_DIMENSION;

/// Local BGESmallENV15 embedder.
pub struct FastembedEmbedder {
    // The ONNX session needs exclusive access per embed call.
    model: Mutex<TextEmbedding>,
}

impl FastembedEmbedder {
    pub fn new() -> Result<Self, StorageError> {
        let model = TextEmbedding::try_new(
            InitOptions::new(EmbeddingModel::BGESmallENV15).with_show_download_progress(false),
        )
        .map_err(|e| StorageError::Unavailable(format!("embedding model init failed: {e}")))?;
        Ok(Self { model: Mutex::new(model) })
    }
}

impl Embedder for FastembedEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, StorageError> {
        let documents: Vec<String> = texts.to_vec();
        let mut model = self.model.lock().expect("embedding model lock");
        model
            .embed(documents, None)
            .map_err(|e| StorageError::Query(format!("embedding failed: {e}")))
    }

    fn model_name(&self) -> &str {
        "BAAI/bge-small-en-v1.5"
    }

    fn dimension(&self) -> usize {
        EMBEDDING_DIMENSION as usize
    }
}

/// Deterministic token-hash embedder (FNV-1a buckets over whitespace
/// tokens). Shares the 384-dim layout so it can write to the same tables.
pub struct HashedEmbedder;

impl HashedEmbedder {
    fn embed_text(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; EMBEDDING_DIMENSION as usize];
        for token in text.to_lowercase().split_whitespace() {
            let mut hash: u64 = 0xcbf29ce484222325;
            for byte in token.bytes() {
                hash ^= byte as u64;
                hash = hash.wrapping_mul(0x100000001b3);
            }
            vector[(hash % EMBEDDING_DIMENSION as u64) as usize] += 1.0;
        }
        vector
    }
}

impl Embedder for HashedEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, StorageError> {
        Ok(texts.iter().map(|t| Self::embed_text(t)).collect())
    }

    fn model_name(&self) -> &str {
        "hashed-tokens"
    }

    fn dimension(&self) -> usize {
        EMBEDDING_DIMENSION as usize
    }
}
