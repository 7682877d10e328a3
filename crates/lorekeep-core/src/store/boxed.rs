//! Object-safe wrappers for the store traits.
//!
//! Same blanket-impl pattern as `BoxLlmProvider`: an object-safe `*Dyn`
//! trait with boxed futures, blanket-implemented for every concrete type.

use std::future::Future;
use std::pin::Pin;

use lorekeep_types::error::StorageError;
use lorekeep_types::search::{Collection, DocumentEntry, ScoredDocument, SearchFilter};

use super::embedder::Embedder;
use super::vector::VectorStore;

/// Object-safe version of [`VectorStore`] with boxed futures.
pub trait VectorStoreDyn: Send + Sync {
    fn insert_boxed<'a>(
        &'a self,
        collection: Collection,
        entry: &'a DocumentEntry,
        embedding: &'a [f32],
    ) -> Pin<Box<dyn Future<Output = Result<(), StorageError>> + Send + 'a>>;

    fn search_boxed<'a>(
        &'a self,
        collection: Collection,
        query_embedding: &'a [f32],
        limit: usize,
        filter: Option<&'a SearchFilter>,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<ScoredDocument>, StorageError>> + Send + 'a>>;

    fn get_boxed<'a>(
        &'a self,
        collection: Collection,
        id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<DocumentEntry>, StorageError>> + Send + 'a>>;

    fn scan_boxed<'a>(
        &'a self,
        collection: Collection,
        filter: Option<&'a SearchFilter>,
        limit: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<DocumentEntry>, StorageError>> + Send + 'a>>;

    fn delete_boxed<'a>(
        &'a self,
        collection: Collection,
        ids: &'a [String],
    ) -> Pin<Box<dyn Future<Output = Result<(), StorageError>> + Send + 'a>>;

    fn count_boxed(
        &self,
        collection: Collection,
    ) -> Pin<Box<dyn Future<Output = Result<u64, StorageError>> + Send + '_>>;

    fn reset_boxed(&self) -> Pin<Box<dyn Future<Output = Result<(), StorageError>> + Send + '_>>;
}

impl<T: VectorStore> VectorStoreDyn for T {
    fn insert_boxed<'a>(
        &'a self,
        collection: Collection,
        entry: &'a DocumentEntry,
        embedding: &'a [f32],
    ) -> Pin<Box<dyn Future<Output = Result<(), StorageError>> + Send + 'a>> {
        Box::pin(self.insert(collection, entry, embedding))
    }

    fn search_boxed<'a>(
        &'a self,
        collection: Collection,
        query_embedding: &'a [f32],
        limit: usize,
        filter: Option<&'a SearchFilter>,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<ScoredDocument>, StorageError>> + Send + 'a>> {
        Box::pin(self.search(collection, query_embedding, limit, filter))
    }

    fn get_boxed<'a>(
        &'a self,
        collection: Collection,
        id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<DocumentEntry>, StorageError>> + Send + 'a>> {
        Box::pin(self.get(collection, id))
    }

    fn scan_boxed<'a>(
        &'a self,
        collection: Collection,
        filter: Option<&'a SearchFilter>,
        limit: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<DocumentEntry>, StorageError>> + Send + 'a>> {
        Box::pin(self.scan(collection, filter, limit))
    }

    fn delete_boxed<'a>(
        &'a self,
        collection: Collection,
        ids: &'a [String],
    ) -> Pin<Box<dyn Future<Output = Result<(), StorageError>> + Send + 'a>> {
        Box::pin(self.delete(collection, ids))
    }

    fn count_boxed(
        &self,
        collection: Collection,
    ) -> Pin<Box<dyn Future<Output = Result<u64, StorageError>> + Send + '_>> {
        Box::pin(self.count(collection))
    }

    fn reset_boxed(&self) -> Pin<Box<dyn Future<Output = Result<(), StorageError>> + Send + '_>> {
        Box::pin(self.reset())
    }
}

/// Type-erased vector store.
pub struct BoxVectorStore {
    inner: Box<dyn VectorStoreDyn + Send + Sync>,
}

impl BoxVectorStore {
    pub fn new<T: VectorStore + 'static>(store: T) -> Self {
        Self { inner: Box::new(store) }
    }

    pub async fn insert(
        &self,
        collection: Collection,
        entry: &DocumentEntry,
        embedding: &[f32],
    ) -> Result<(), StorageError> {
        self.inner.insert_boxed(collection, entry, embedding).await
    }

    pub async fn search(
        &self,
        collection: Collection,
        query_embedding: &[f32],
        limit: usize,
        filter: Option<&SearchFilter>,
    ) -> Result<Vec<ScoredDocument>, StorageError> {
        self.inner.search_boxed(collection, query_embedding, limit, filter).await
    }

    pub async fn get(&self, collection: Collection, id: &str) -> Result<Option<DocumentEntry>, StorageError> {
        self.inner.get_boxed(collection, id).await
    }

    pub async fn scan(
        &self,
        collection: Collection,
        filter: Option<&SearchFilter>,
        limit: usize,
    ) -> Result<Vec<DocumentEntry>, StorageError> {
        self.inner.scan_boxed(collection, filter, limit).await
    }

    pub async fn delete(&self, collection: Collection, ids: &[String]) -> Result<(), StorageError> {
        self.inner.delete_boxed(collection, ids).await
    }

    pub async fn count(&self, collection: Collection) -> Result<u64, StorageError> {
        self.inner.count_boxed(collection).await
    }

    pub async fn reset(&self) -> Result<(), StorageError> {
        self.inner.reset_boxed().await
    }
}

/// Object-safe version of [`Embedder`] with boxed futures.
pub trait EmbedderDyn: Send + Sync {
    fn embed_boxed<'a>(
        &'a self,
        texts: &'a [String],
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Vec<f32>>, StorageError>> + Send + 'a>>;

    fn model_name_dyn(&self) -> &str;

    fn dimension_dyn(&self) -> usize;
}

impl<T: Embedder> EmbedderDyn for T {
    fn embed_boxed<'a>(
        &'a self,
        texts: &'a [String],
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Vec<f32>>, StorageError>> + Send + 'a>> {
        Box::pin(self.embed(texts))
    }

    fn model_name_dyn(&self) -> &str {
        self.model_name()
    }

    fn dimension_dyn(&self) -> usize {
        self.dimension()
    }
}

/// Type-erased embedder for runtime selection (fastembed or the hashed
/// fallback).
pub struct BoxEmbedder {
    inner: Box<dyn EmbedderDyn + Send + Sync>,
}

impl BoxEmbedder {
    pub fn new<T: Embedder + 'static>(embedder: T) -> Self {
        Self { inner: Box::new(embedder) }
    }

    pub async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, StorageError> {
        self.inner.embed_boxed(texts).await
    }

    /// Embed a single text.
    pub async fn embed_one(&self, text: &str) -> Result<Vec<f32>, StorageError> {
        let text = text.to_string();
        let mut vectors = self.embed(std::slice::from_ref(&text)).await?;
        vectors
            .pop()
            .ok_or_else(|| StorageError::Query("embedder returned no vector".into()))
    }

    pub fn model_name(&self) -> &str {
        self.inner.model_name_dyn()
    }

    pub fn dimension(&self) -> usize {
        self.inner.dimension_dyn()
    }
}
