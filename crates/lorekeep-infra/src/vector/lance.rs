//! LanceDB-backed archive store.
//!
//! One table per collection, named `{series_slug}_{collection}`. Implements
//! the `VectorStore` port with cosine vector search, SQL filters on the
//! indexed columns, and idempotent reset.

use std::path::PathBuf;
use std::sync::Arc;

use arrow_array::{
    Array, FixedSizeListArray, Float32Array, RecordBatch, RecordBatchIterator, StringArray,
};
use arrow_schema::{DataType, Field};
use futures_util::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};

use lorekeep_core::store::vector::VectorStore;
use lorekeep_types::error::StorageError;
use lorekeep_types::search::{Collection, DocumentEntry, ScoredDocument, SearchFilter};

use super::schema::{archive_schema, EMBEDDING_DIMENSION};

/// Upper bound for scan/search result sets.
const MAX_RESULTS: usize = 10_000;

/// LanceDB archive store for one series.
pub struct LanceArchiveStore {
    db: lancedb::Connection,
    base_path: PathBuf,
    series_slug: String,
    dimension: i32,
}

impl LanceArchiveStore {
    /// Open or create the store at `base_path`, namespaced by series slug.
    pub async fn new(base_path: PathBuf, series_slug: impl Into<String>) -> Result<Self, StorageError> {
        std::fs::create_dir_all(&base_path)
            .map_err(|e| StorageError::Unavailable(format!("cannot create {}: {e}", base_path.display())))?;

        let uri = base_path
            .to_str()
            .ok_or_else(|| StorageError::Unavailable(format!("path is not UTF-8: {}", base_path.display())))?;

        let db = lancedb::connect(uri)
            .execute()
            .await
            .map_err(|e| StorageError::Unavailable(format!("lancedb connect failed: {e}")))?;

        Ok(Self {
            db,
            base_path,
            series_slug: series_slug.into(),
            dimension: EMBEDDING_DIMENSION,
        })
    }

    /// Override the vector dimension (must match the embedder in use).
    pub fn with_dimension(mut self, dimension: i32) -> Self {
        self.dimension = dimension;
        self
    }

    pub fn base_path(&self) -> &PathBuf {
        &self.base_path
    }

    /// Table name for a collection, e.g. `breaking_point_plot_events`.
    pub fn table_name(&self, collection: Collection) -> String {
        format!("{}_{}", self.series_slug, collection)
    }

    /// Open the collection table, creating it empty if missing.
    async fn ensure_table(&self, collection: Collection) -> Result<lancedb::Table, StorageError> {
        let name = self.table_name(collection);
        match self.db.open_table(&name).execute().await {
            Ok(table) => Ok(table),
            Err(lancedb::Error::TableNotFound { .. }) => self
                .db
                .create_empty_table(&name, Arc::new(archive_schema(self.dimension)))
                .execute()
                .await
                .map_err(|e| StorageError::Unavailable(format!("cannot create table {name}: {e}"))),
            Err(e) => Err(StorageError::Unavailable(format!("cannot open table {name}: {e}"))),
        }
    }

    fn build_record_batch(
        &self,
        entry: &DocumentEntry,
        embedding: &[f32],
    ) -> Result<RecordBatch, StorageError> {
        if embedding.len() != self.dimension as usize {
            return Err(StorageError::Query(format!(
                "embedding dimension mismatch: expected {}, got {}",
                self.dimension,
                embedding.len()
            )));
        }

        let schema = Arc::new(archive_schema(self.dimension));
        let metadata_json = serde_json::to_string(&entry.metadata)
            .map_err(|e| StorageError::Query(format!("metadata serialization failed: {e}")))?;

        let id_array = StringArray::from(vec![entry.id.clone()]);
        let document_array = StringArray::from(vec![entry.document.clone()]);
        let metadata_array = StringArray::from(vec![metadata_json]);
        let episode_id_array =
            StringArray::from(vec![entry.meta_str("episode_id").map(str::to_string)]);
        let plot_arc_array = StringArray::from(vec![entry.meta_str("plot_arc").map(str::to_string)]);

        let values = Float32Array::from(embedding.to_vec());
        let field = Arc::new(Field::new("item", DataType::Float32, true));
        let vector_array = FixedSizeListArray::new(field, self.dimension, Arc::new(values), None);

        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(id_array),
                Arc::new(document_array),
                Arc::new(metadata_array),
                Arc::new(episode_id_array),
                Arc::new(plot_arc_array),
                Arc::new(vector_array),
            ],
        )
        .map_err(|e| StorageError::Query(format!("record batch build failed: {e}")))
    }

    fn batch_to_entries(batch: &RecordBatch) -> Result<Vec<DocumentEntry>, StorageError> {
        let num_rows = batch.num_rows();
        if num_rows == 0 {
            return Ok(Vec::new());
        }

        let id_col = string_column(batch, "id")?;
        let document_col = string_column(batch, "document")?;
        let metadata_col = string_column(batch, "metadata")?;

        let mut entries = Vec::with_capacity(num_rows);
        for i in 0..num_rows {
            let metadata = serde_json::from_str(metadata_col.value(i))
                .unwrap_or(serde_json::Value::Null);
            entries.push(DocumentEntry {
                id: id_col.value(i).to_string(),
                document: document_col.value(i).to_string(),
                metadata,
            });
        }
        Ok(entries)
    }
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray, StorageError> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| StorageError::Query(format!("column '{name}' missing or not a string array")))
}

/// Escape a value for a LanceDB SQL filter literal.
fn escape(value: &str) -> String {
    value.replace('\'', "''")
}

fn filter_expr(filter: &SearchFilter) -> String {
    format!("{} = '{}'", filter.column(), escape(filter.value()))
}

impl VectorStore for LanceArchiveStore {
    async fn insert(
        &self,
        collection: Collection,
        entry: &DocumentEntry,
        embedding: &[f32],
    ) -> Result<(), StorageError> {
        let table = self.ensure_table(collection).await?;
        let batch = self.build_record_batch(entry, embedding)?;
        let schema = batch.schema();
        let reader = RecordBatchIterator::new(vec![Ok(batch)], schema);

        table
            .add(reader)
            .execute()
            .await
            .map_err(|e| StorageError::Query(format!("insert into {collection} failed: {e}")))?;
        Ok(())
    }

    async fn search(
        &self,
        collection: Collection,
        query_embedding: &[f32],
        limit: usize,
        filter: Option<&SearchFilter>,
    ) -> Result<Vec<ScoredDocument>, StorageError> {
        let table = self.ensure_table(collection).await?;

        let mut query = table
            .vector_search(query_embedding)
            .map_err(|e| StorageError::Query(format!("vector search setup failed: {e}")))?
            .distance_type(lancedb::DistanceType::Cosine)
            .limit(limit.min(MAX_RESULTS));
        if let Some(filter) = filter {
            query = query.only_if(filter_expr(filter));
        }

        let results = query
            .execute()
            .await
            .map_err(|e| StorageError::Query(format!("vector search on {collection} failed: {e}")))?;
        let batches: Vec<RecordBatch> = results
            .try_collect()
            .await
            .map_err(|e| StorageError::Query(format!("result collection failed: {e}")))?;

        let mut hits = Vec::new();
        for batch in &batches {
            let distance_col = batch
                .column_by_name("_distance")
                .and_then(|c| c.as_any().downcast_ref::<Float32Array>());
            let entries = Self::batch_to_entries(batch)?;
            for (i, entry) in entries.into_iter().enumerate() {
                let distance = distance_col.map_or(0.0, |d| d.value(i));
                hits.push(ScoredDocument { entry, relevance_score: 1.0 - distance, distance });
            }
        }

        hits.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(limit);
        Ok(hits)
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<DocumentEntry>, StorageError> {
        let table = self.ensure_table(collection).await?;
        let results = table
            .query()
            .only_if(format!("id = '{}'", escape(id)))
            .limit(1)
            .execute()
            .await
            .map_err(|e| StorageError::Query(format!("get from {collection} failed: {e}")))?;
        let batches: Vec<RecordBatch> = results
            .try_collect()
            .await
            .map_err(|e| StorageError::Query(format!("result collection failed: {e}")))?;

        for batch in &batches {
            if let Some(entry) = Self::batch_to_entries(batch)?.into_iter().next() {
                return Ok(Some(entry));
            }
        }
        Ok(None)
    }

    async fn scan(
        &self,
        collection: Collection,
        filter: Option<&SearchFilter>,
        limit: usize,
    ) -> Result<Vec<DocumentEntry>, StorageError> {
        let table = self.ensure_table(collection).await?;

        let mut query = table.query().limit(limit.min(MAX_RESULTS));
        if let Some(filter) = filter {
            query = query.only_if(filter_expr(filter));
        }

        let results = query
            .execute()
            .await
            .map_err(|e| StorageError::Query(format!("scan of {collection} failed: {e}")))?;
        let batches: Vec<RecordBatch> = results
            .try_collect()
            .await
            .map_err(|e| StorageError::Query(format!("result collection failed: {e}")))?;

        let mut entries = Vec::new();
        for batch in &batches {
            entries.extend(Self::batch_to_entries(batch)?);
        }
        Ok(entries)
    }

    async fn delete(&self, collection: Collection, ids: &[String]) -> Result<(), StorageError> {
        if ids.is_empty() {
            return Ok(());
        }
        let table = self.ensure_table(collection).await?;
        let id_list = ids
            .iter()
            .map(|id| format!("'{}'", escape(id)))
            .collect::<Vec<_>>()
            .join(", ");
        table
            .delete(&format!("id IN ({id_list})"))
            .await
            .map_err(|e| StorageError::Query(format!("delete from {collection} failed: {e}")))?;
        Ok(())
    }

    async fn count(&self, collection: Collection) -> Result<u64, StorageError> {
        let table = self.ensure_table(collection).await?;
        let count = table
            .count_rows(None)
            .await
            .map_err(|e| StorageError::Query(format!("count of {collection} failed: {e}")))?;
        Ok(count as u64)
    }

    async fn reset(&self) -> Result<(), StorageError> {
        for collection in Collection::ALL {
            let name = self.table_name(collection);
            match self.db.drop_table(&name, &[]).await {
                Ok(()) | Err(lancedb::Error::TableNotFound { .. }) => {}
                Err(e) => {
                    return Err(StorageError::Query(format!("drop of {name} failed: {e}")));
                }
            }
            // Recreate empty so queries after reset see empty collections.
            self.ensure_table(collection).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const DIM: i32 = 8;

    async fn store() -> (LanceArchiveStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = LanceArchiveStore::new(dir.path().to_path_buf(), "test_show")
            .await
            .expect("store")
            .with_dimension(DIM);
        (store, dir)
    }

    fn vector(seed: f32) -> Vec<f32> {
        (0..DIM).map(|i| seed + i as f32 * 0.1).collect()
    }

    fn scene_entry(id: &str, episode_id: &str, text: &str) -> DocumentEntry {
        DocumentEntry::new(
            id,
            text,
            json!({"scene_id": id, "episode_id": episode_id, "scene_number": 1}),
        )
    }

    #[tokio::test]
    async fn test_table_names_are_namespaced() {
        let (store, _dir) = store().await;
        assert_eq!(store.table_name(Collection::Scenes), "test_show_scenes");
        assert_eq!(store.table_name(Collection::PlotEvents), "test_show_plot_events");
    }

    #[tokio::test]
    async fn test_insert_and_get_roundtrip() {
        let (store, _dir) = store().await;
        let entry = scene_entry("S01E01_S001", "S01E01", "Alice confronts Bob");
        store.insert(Collection::Scenes, &entry, &vector(0.1)).await.unwrap();

        let fetched = store.get(Collection::Scenes, "S01E01_S001").await.unwrap().unwrap();
        assert_eq!(fetched.id, "S01E01_S001");
        assert_eq!(fetched.document, "Alice confronts Bob");
        assert_eq!(fetched.meta_str("episode_id"), Some("S01E01"));

        assert!(store.get(Collection::Scenes, "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_dimension_mismatch_rejected() {
        let (store, _dir) = store().await;
        let entry = scene_entry("S01E01_S001", "S01E01", "text");
        let result = store.insert(Collection::Scenes, &entry, &[0.0; 3]).await;
        assert!(matches!(result, Err(StorageError::Query(_))));
    }

    #[tokio::test]
    async fn test_search_ranks_by_similarity() {
        let (store, _dir) = store().await;
        store
            .insert(Collection::Scenes, &scene_entry("a", "S01E01", "close"), &vector(0.1))
            .await
            .unwrap();
        store
            .insert(Collection::Scenes, &scene_entry("b", "S01E01", "far"), &vector(5.0))
            .await
            .unwrap();

        let hits = store.search(Collection::Scenes, &vector(0.1), 5, None).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].entry.id, "a");
        assert!(hits[0].distance <= hits[1].distance);
    }

    #[tokio::test]
    async fn test_scan_with_episode_filter() {
        let (store, _dir) = store().await;
        store
            .insert(Collection::Scenes, &scene_entry("s1", "S01E01", "one"), &vector(0.1))
            .await
            .unwrap();
        store
            .insert(Collection::Scenes, &scene_entry("s2", "S01E02", "two"), &vector(0.2))
            .await
            .unwrap();

        let filter = SearchFilter::EpisodeId("S01E01".to_string());
        let entries = store.scan(Collection::Scenes, Some(&filter), 100).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, "s1");
    }

    #[tokio::test]
    async fn test_delete_by_ids() {
        let (store, _dir) = store().await;
        store
            .insert(Collection::Scenes, &scene_entry("s1", "S01E01", "one"), &vector(0.1))
            .await
            .unwrap();
        store
            .insert(Collection::Scenes, &scene_entry("s2", "S01E01", "two"), &vector(0.2))
            .await
            .unwrap();

        store
            .delete(Collection::Scenes, &["s1".to_string()])
            .await
            .unwrap();
        assert_eq!(store.count(Collection::Scenes).await.unwrap(), 1);
        assert!(store.get(Collection::Scenes, "s1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reset_recreates_empty_collections() {
        let (store, _dir) = store().await;
        store
            .insert(Collection::Scenes, &scene_entry("s1", "S01E01", "one"), &vector(0.1))
            .await
            .unwrap();

        store.reset().await.unwrap();

        for collection in Collection::ALL {
            assert_eq!(store.count(collection).await.unwrap(), 0);
        }
        // Reset on an already-empty store is fine too.
        store.reset().await.unwrap();
    }

    #[tokio::test]
    async fn test_id_with_quote_is_escaped() {
        let (store, _dir) = store().await;
        let entry = DocumentEntry::new("o'brien", "Character: O'Brien", json!({}));
        store.insert(Collection::Characters, &entry, &vector(0.3)).await.unwrap();

        let fetched = store.get(Collection::Characters, "o'brien").await.unwrap();
        assert!(fetched.is_some());
    }
}
