//! Arrow schema for the archive tables.
//!
//! All five collections share one layout: id, searchable document text, a
//! JSON metadata column, two nullable filter columns (`episode_id`,
//! `plot_arc`) duplicated out of the metadata for SQL filtering, and the
//! embedding vector.
//!
//! Arrow versions MUST match lancedb's transitive dependency (57.3 for
//! lancedb 0.26).

use std::sync::Arc;

use arrow_schema::{DataType, Field, Schema};

/// BGESmallENV15 embedding dimension (shared by the hashed fallback).
pub const EMBEDDING_DIMENSION: i32 = 384;

/// Schema for an archive collection table.
pub fn archive_schema(dimension: i32) -> Schema {
    Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("document", DataType::Utf8, false),
        Field::new("metadata", DataType::Utf8, false),
        Field::new("episode_id", DataType::Utf8, true),
        Field::new("plot_arc", DataType::Utf8, true),
        Field::new(
            "vector",
            DataType::FixedSizeList(
                Arc::new(Field::new("item", DataType::Float32, true)),
                dimension,
            ),
            false,
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_fields() {
        let schema = archive_schema(EMBEDDING_DIMENSION);
        assert_eq!(schema.fields().len(), 6);
        assert!(schema.field_with_name("id").is_ok());
        assert!(schema.field_with_name("document").is_ok());
        assert!(schema.field_with_name("metadata").is_ok());
        assert!(schema.field_with_name("episode_id").is_ok());
        assert!(schema.field_with_name("plot_arc").is_ok());

        let vector_field = schema.field_with_name("vector").unwrap();
        match vector_field.data_type() {
            DataType::FixedSizeList(_, size) => assert_eq!(*size, EMBEDDING_DIMENSION),
            other => panic!("expected FixedSizeList, got {other:?}"),
        }
    }

    #[test]
    fn test_filter_columns_are_nullable() {
        let schema = archive_schema(EMBEDDING_DIMENSION);
        assert!(schema.field_with_name("episode_id").unwrap().is_nullable());
        assert!(schema.field_with_name("plot_arc").unwrap().is_nullable());
        assert!(!schema.field_with_name("id").unwrap().is_nullable());
    }

    #[test]
    fn test_embedding_dimension_constant() {
        assert_eq!(EMBEDDING_DIMENSION, 384);
    }
}
