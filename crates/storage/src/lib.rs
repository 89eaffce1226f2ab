//! Vector index and graph store adapters
//!
//! Retrieval consumes storage through two narrow traits: [`VectorIndex`]
//! for namespaced nearest-neighbour lookups and [`GraphStore`] for the
//! node matching and path walks the graph branch needs. Qdrant and Neo4j
//! back them in production; in-memory mocks back them in tests.

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

pub mod error;
mod factory;
mod mock;
mod neo4j;
mod qdrant;

pub use error::StorageError;
pub use factory::{create_graph_store, create_vector_index};
pub use mock::MockVectorIndex;
pub use neo4j::{MockGraphStore, Neo4jGraphStore};
pub use qdrant::QdrantVectorIndex;

use async_trait::async_trait;
use hybridrag_core::Error;
use serde::{Deserialize, Serialize};

// ==== Traits ====

/// Nearest-neighbour search over chunk vectors, partitioned by namespace
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Return up to `top_k` matches for `vector` within `namespace`,
    /// best first, each with its stored payload.
    async fn query_namespace(
        &self,
        namespace: &str,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<VectorMatch>, Error>;
}

/// Graph traversal operations used by the graph retrieval branch
///
/// Every lookup is scoped to one user's partition of the graph.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Find the node most similar to `vector` via the similarity index.
    ///
    /// Returns an error whose message mentions the index when the index
    /// itself is missing or unusable.
    async fn match_similar_node(
        &self,
        vector: &[f32],
        user_id: &str,
    ) -> Result<Option<GraphNode>, Error>;

    /// Find a document root from which `node` is reachable.
    async fn find_root_for(
        &self,
        node: &GraphNode,
        user_id: &str,
    ) -> Result<Option<GraphNode>, Error>;

    /// Nodes on the shortest path from `root` to `target`, root first.
    async fn shortest_path(
        &self,
        root: &GraphNode,
        target: &GraphNode,
    ) -> Result<Vec<PathStep>, Error>;

    /// Any one content-bearing node, without ranking.
    async fn find_any_node(&self, user_id: &str) -> Result<Option<GraphNode>, Error>;
}

// ==== Models ====

/// A single hit from the vector index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorMatch {
    pub id: String,
    pub score: f32,
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// Reference to a graph node
///
/// For document roots `content` holds the document title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    pub content: String,
}

impl GraphNode {
    pub fn new(id: impl Into<String>, label: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            content: content.into(),
        }
    }
}

/// One node along a traversal path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathStep {
    pub label: String,
    pub content: String,
}

impl PathStep {
    pub fn new(label: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            content: content.into(),
        }
    }
}

impl From<&GraphNode> for PathStep {
    fn from(node: &GraphNode) -> Self {
        Self::new(node.label.clone(), node.content.clone())
    }
}
