//! Vector store trait.
//!
//! Defines the interface over the five named collections. Inserts are
//! append-only; queries return nearest-neighbor matches ranked by embedding
//! similarity with no recency ordering beyond the similarity score.

use lorekeep_types::error::StorageError;
use lorekeep_types::search::{Collection, DocumentEntry, ScoredDocument, SearchFilter};

/// Trait for vector-indexed document storage with semantic search.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
/// Implementations live in lorekeep-infra.
pub trait VectorStore: Send + Sync {
    /// Insert a document with its embedding vector. Append-only.
    fn insert(
        &self,
        collection: Collection,
        entry: &DocumentEntry,
        embedding: &[f32],
    ) -> impl std::future::Future<Output = Result<(), StorageError>> + Send;

    /// Nearest-neighbor search, ranked by similarity, optionally filtered
    /// on an indexed metadata column.
    fn search(
        &self,
        collection: Collection,
        query_embedding: &[f32],
        limit: usize,
        filter: Option<&SearchFilter>,
    ) -> impl std::future::Future<Output = Result<Vec<ScoredDocument>, StorageError>> + Send;

    /// Exact lookup by id.
    fn get(
        &self,
        collection: Collection,
        id: &str,
    ) -> impl std::future::Future<Output = Result<Option<DocumentEntry>, StorageError>> + Send;

    /// Full scan (no vector ranking), optionally filtered.
    fn scan(
        &self,
        collection: Collection,
        filter: Option<&SearchFilter>,
        limit: usize,
    ) -> impl std::future::Future<Output = Result<Vec<DocumentEntry>, StorageError>> + Send;

    /// Delete documents by id. Missing ids are ignored.
    fn delete(
        &self,
        collection: Collection,
        ids: &[String],
    ) -> impl std::future::Future<Output = Result<(), StorageError>> + Send;

    /// Count documents in a collection.
    fn count(
        &self,
        collection: Collection,
    ) -> impl std::future::Future<Output = Result<u64, StorageError>> + Send;

    /// Delete all data in every collection and recreate them empty.
    fn reset(&self) -> impl std::future::Future<Output = Result<(), StorageError>> + Send;
}
