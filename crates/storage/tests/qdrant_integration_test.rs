//! Integration tests for the Qdrant vector index
//!
//! These tests require a running Qdrant instance with a populated collection.
//! Run with: cargo test --package hybridrag-storage -- --ignored

use hybridrag_core::config::StorageConfig;
use hybridrag_storage::{create_vector_index, VectorIndex};

const DIMENSION: usize = 1024;

#[tokio::test]
#[ignore] // Run with --ignored when Qdrant is available
async fn test_qdrant_rejects_wrong_dimension() {
    let index = create_vector_index(&StorageConfig::default(), DIMENSION)
        .await
        .unwrap();

    let err = index
        .query_namespace("test-user", &[0.1; 3], 5)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("expected 1024, got 3"));
}

#[tokio::test]
#[ignore] // Run with --ignored when Qdrant is available
async fn test_qdrant_unknown_namespace_is_empty() {
    let index = create_vector_index(&StorageConfig::default(), DIMENSION)
        .await
        .unwrap();

    let matches = index
        .query_namespace("namespace-that-does-not-exist", &[0.01; DIMENSION], 5)
        .await
        .unwrap();
    assert!(matches.is_empty());
}
