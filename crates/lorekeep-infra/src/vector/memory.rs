//! In-process vector store.
//!
//! Backs tests and ephemeral sessions with the same `VectorStore` contract
//! as the LanceDB store: cosine ranking, filters, append-only inserts.

use std::collections::HashMap;
use std::sync::Mutex;

use lorekeep_core::store::vector::VectorStore;
use lorekeep_types::error::StorageError;
use lorekeep_types::search::{Collection, DocumentEntry, ScoredDocument, SearchFilter};

/// In-memory archive store.
#[derive(Default)]
pub struct MemoryVectorStore {
    collections: Mutex<HashMap<Collection, Vec<(DocumentEntry, Vec<f32>)>>>,
}

impl MemoryVectorStore {
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

impl VectorStore for MemoryVectorStore {
    async fn insert(
        &self,
        collection: Collection,
        entry: &DocumentEntry,
        embedding: &[f32],
    ) -> Result<(), StorageError> {
        self.collections
            .lock()
            .expect("store lock")
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
        let guard = self.collections.lock().expect("store lock");
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
        hits.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(limit);
        Ok(hits)
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<DocumentEntry>, StorageError> {
        Ok(self
            .collections
            .lock()
            .expect("store lock")
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
            .expect("store lock")
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
        if let Some(entries) = self.collections.lock().expect("store lock").get_mut(&collection) {
            entries.retain(|(entry, _)| !ids.contains(&entry.id));
        }
        Ok(())
    }

    async fn count(&self, collection: Collection) -> Result<u64, StorageError> {
        Ok(self
            .collections
            .lock()
            .expect("store lock")
            .get(&collection)
            .map(|entries| entries.len() as u64)
            .unwrap_or(0))
    }

    async fn reset(&self) -> Result<(), StorageError> {
        self.collections.lock().expect("store lock").clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(id: &str, episode_id: &str) -> DocumentEntry {
        DocumentEntry::new(id, format!("document {id}"), json!({"episode_id": episode_id}))
    }

    #[tokio::test]
    async fn test_insert_get_count() {
        let store = MemoryVectorStore::new();
        store.insert(Collection::Scenes, &entry("a", "S01E01"), &[1.0, 0.0]).await.unwrap();
        assert_eq!(store.count(Collection::Scenes).await.unwrap(), 1);
        assert!(store.get(Collection::Scenes, "a").await.unwrap().is_some());
        assert!(store.get(Collection::Episodes, "a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_search_ranking() {
        let store = MemoryVectorStore::new();
        store.insert(Collection::Scenes, &entry("near", "S01E01"), &[1.0, 0.0]).await.unwrap();
        store.insert(Collection::Scenes, &entry("far", "S01E01"), &[0.0, 1.0]).await.unwrap();

        let hits = store.search(Collection::Scenes, &[1.0, 0.1], 10, None).await.unwrap();
        assert_eq!(hits[0].entry.id, "near");
        assert!(hits[0].relevance_score > hits[1].relevance_score);
    }

    #[tokio::test]
    async fn test_filtered_scan() {
        let store = MemoryVectorStore::new();
        store.insert(Collection::Scenes, &entry("a", "S01E01"), &[1.0]).await.unwrap();
        store.insert(Collection::Scenes, &entry("b", "S01E02"), &[1.0]).await.unwrap();

        let filter = SearchFilter::EpisodeId("S01E02".to_string());
        let entries = store.scan(Collection::Scenes, Some(&filter), 10).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, "b");
    }

    #[tokio::test]
    async fn test_reset_clears_everything() {
        let store = MemoryVectorStore::new();
        store.insert(Collection::Scenes, &entry("a", "S01E01"), &[1.0]).await.unwrap();
        store.insert(Collection::Characters, &entry("b", "S01E01"), &[1.0]).await.unwrap();
        store.reset().await.unwrap();
        for collection in Collection::ALL {
            assert_eq!(store.count(collection).await.unwrap(), 0);
        }
    }
}
