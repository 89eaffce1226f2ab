use crate::{GraphStore, Neo4jGraphStore, QdrantVectorIndex, VectorIndex};
use hybridrag_core::{config::StorageConfig, Error};
use std::sync::Arc;

/// Connects to the Qdrant vector index described by `config`.
///
/// `dimension` is the embedding dimension; queries with any other
/// length are rejected before reaching the server.
///
/// # Errors
/// Returns an error if the server cannot be reached
pub async fn create_vector_index(
    config: &StorageConfig,
    dimension: usize,
) -> Result<Arc<dyn VectorIndex>, Error> {
    let index = QdrantVectorIndex::connect(config, dimension).await?;
    Ok(Arc::new(index))
}

/// Connects to the Neo4j graph store described by `config`.
///
/// # Errors
/// Returns an error if the Bolt connection cannot be established
pub async fn create_graph_store(config: &StorageConfig) -> Result<Arc<dyn GraphStore>, Error> {
    let store = Neo4jGraphStore::connect(config).await?;
    Ok(Arc::new(store))
}
