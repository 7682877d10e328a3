//! Shared test doubles for in-crate unit tests.
//!
//! `MockProvider` replays scripted responses and records every request it
//! receives; `StubStore` is a minimal in-process `VectorStore` (the full
//! in-memory implementation lives in lorekeep-infra); `StubEmbedder`
//! produces deterministic token-hash vectors so similarity ranking is
//! stable across runs.

use std::collections::HashMap;
use std::sync::Mutex;

use lorekeep_types::error::StorageError;
use lorekeep_types::llm::{CompletionRequest, CompletionResponse, LlmError, Usage};
use lorekeep_types::search::{Collection, DocumentEntry, ScoredDocument, SearchFilter};

use crate::llm::provider::LlmProvider;
use crate::store::embedder::Embedder;
use crate::store::vector::VectorStore;

/// Scripted LLM provider: pops responses in order, records requests.
pub struct MockProvider {
    responses: Mutex<Vec<Result<String, LlmError>>>,
    pub requests: Mutex<Vec<CompletionRequest>>,
}

impl MockProvider {
    pub fn new(responses: Vec<&str>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().rev().map(|s| Ok(s.to_string())).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_results(results: Vec<Result<String, LlmError>>) -> Self {
        Self {
            responses: Mutex::new(results.into_iter().rev().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn request_at(&self, index: usize) -> CompletionRequest {
        self.requests.lock().unwrap()[index].clone()
    }
}

impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self
            .responses
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| Ok("{}".to_string()));
        next.map(|content| CompletionResponse {
            id: "mock-response".to_string(),
            content,
            model: "mock-model".to_string(),
            usage: Usage::default(),
        })
    }
}

/// Shared handle so tests can inspect requests after the mock is boxed.
impl LlmProvider for std::sync::Arc<MockProvider> {
    fn name(&self) -> &str {
        self.as_ref().name()
    }

    fn model(&self) -> &str {
        self.as_ref().model()
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.as_ref().complete(request).await
    }
}

/// Minimal in-process vector store for core tests.
#[derive(Default)]
pub struct StubStore {
    collections: Mutex<HashMap<Collection, Vec<(DocumentEntry, Vec<f32>)>>>,
}

impl StubStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - dot / (norm_a * norm_b)
}

fn matches_filter(entry: &DocumentEntry, filter: Option<&SearchFilter>) -> bool {
    match filter {
        None => true,
        Some(f) => entry.meta_str(f.column()) == Some(f.value()),
    }
}

impl VectorStore for StubStore {
    async fn insert(
        &self,
        collection: Collection,
        entry: &DocumentEntry,
        embedding: &[f32],
    ) -> Result<(), StorageError> {
        self.collections
            .lock()
            .unwrap()
            .entry(collection)
            .or_default()
            .push((entry.clone(), embedding.to_vec()));
        Ok(())
    }

    async fn search(
        &self,
        collection: Collection,
        query_embedding: &[f32],
        limit: usize,
        filter: Option<&SearchFilter>,
    ) -> Result<Vec<ScoredDocument>, StorageError> {
        let guard = self.collections.lock().unwrap();
        let mut hits: Vec<ScoredDocument> = guard
            .get(&collection)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|(entry, _)| matches_filter(entry, filter))
                    .map(|(entry, vector)| {
                        let distance = cosine_distance(query_embedding, vector);
                        ScoredDocument {
                            entry: entry.clone(),
                            relevance_score: 1.0 - distance,
                            distance,
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();
        hits.sort_by(|a, b| {
            a.distance.partial_cmp(&b.distance).unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(limit);
        Ok(hits)
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<DocumentEntry>, StorageError> {
        Ok(self
            .collections
            .lock()
            .unwrap()
            .get(&collection)
            .and_then(|entries| entries.iter().find(|(e, _)| e.id == id).map(|(e, _)| e.clone())))
    }

    async fn scan(
        &self,
        collection: Collection,
        filter: Option<&SearchFilter>,
        limit: usize,
    ) -> Result<Vec<DocumentEntry>, StorageError> {
        Ok(self
            .collections
            .lock()
            .unwrap()
            .get(&collection)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|(entry, _)| matches_filter(entry, filter))
                    .take(limit)
                    .map(|(entry, _)| entry.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn delete(&self, collection: Collection, ids: &[String]) -> Result<(), StorageError> {
        if let Some(entries) = self.collections.lock().unwrap().get_mut(&collection) {
            entries.retain(|(entry, _)| !ids.contains(&entry.id));
        }
        Ok(())
    }

    async fn count(&self, collection: Collection) -> Result<u64, StorageError> {
        Ok(self
            .collections
            .lock()
            .unwrap()
            .get(&collection)
            .map(|entries| entries.len() as u64)
            .unwrap_or(0))
    }

    async fn reset(&self) -> Result<(), StorageError> {
        self.collections.lock().unwrap().clear();
        Ok(())
    }
}

/// Deterministic token-hash embedder, 32 dimensions.
pub struct StubEmbedder;

impl StubEmbedder {
    pub const DIMENSION: usize = 32;

    fn embed_text(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; Self::DIMENSION];
        for token in text.to_lowercase().split_whitespace() {
            let mut hash: u64 = 1469598103934665603;
            for byte in token.bytes() {
                hash ^= byte as u64;
                hash = hash.wrapping_mul(1099511628211);
            }
            vector[(hash % Self::DIMENSION as u64) as usize] += 1.0;
        }
        vector
    }
}

impl Embedder for StubEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, StorageError> {
        Ok(texts.iter().map(|t| Self::embed_text(t)).collect())
    }

    fn model_name(&self) -> &str {
        "stub-hash"
    }

    fn dimension(&self) -> usize {
        Self::DIMENSION
    }
}
