//! In-memory graph store for testing

use crate::{GraphNode, GraphStore, PathStep};
use async_trait::async_trait;
use hybridrag_core::Error;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Scripted graph store
///
/// Holds a single user's partition: one similarity target, its document
/// root, the path between them and a fallback node for unranked lookups.
/// Lookups for any other user find nothing.
#[derive(Default)]
pub struct MockGraphStore {
    user_id: String,
    target: Option<GraphNode>,
    root: Option<GraphNode>,
    path: Vec<PathStep>,
    any_node: Option<GraphNode>,
    similarity_error: Option<String>,
    path_error: Option<String>,
    similarity_calls: AtomicUsize,
    fallback_calls: AtomicUsize,
}

impl MockGraphStore {
    /// Create an empty graph partition for `user_id`
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Default::default()
        }
    }

    /// Set the node returned by similarity matching
    pub fn with_target(mut self, target: GraphNode) -> Self {
        self.target = Some(target);
        self
    }

    /// Set the document root and the path from it to the target
    pub fn with_root(mut self, root: GraphNode, path: Vec<PathStep>) -> Self {
        self.root = Some(root);
        self.path = path;
        self
    }

    /// Set the node returned by the unranked lookup
    pub fn with_any_node(mut self, node: GraphNode) -> Self {
        self.any_node = Some(node);
        self
    }

    /// Make similarity matching fail with `message`
    pub fn with_similarity_error(mut self, message: impl Into<String>) -> Self {
        self.similarity_error = Some(message.into());
        self
    }

    /// Make shortest-path lookups fail with `message`
    pub fn with_path_error(mut self, message: impl Into<String>) -> Self {
        self.path_error = Some(message.into());
        self
    }

    pub fn similarity_calls(&self) -> usize {
        self.similarity_calls.load(Ordering::SeqCst)
    }

    pub fn fallback_calls(&self) -> usize {
        self.fallback_calls.load(Ordering::SeqCst)
    }

    fn owns(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}

#[async_trait]
impl GraphStore for MockGraphStore {
    async fn match_similar_node(
        &self,
        _vector: &[f32],
        user_id: &str,
    ) -> Result<Option<GraphNode>, Error> {
        self.similarity_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(ref message) = self.similarity_error {
            return Err(Error::storage(message.clone()));
        }
        Ok(self.target.clone().filter(|_| self.owns(user_id)))
    }

    async fn find_root_for(
        &self,
        node: &GraphNode,
        user_id: &str,
    ) -> Result<Option<GraphNode>, Error> {
        let reaches_target = self.target.as_ref().is_some_and(|t| t.id == node.id);
        Ok(self
            .root
            .clone()
            .filter(|_| reaches_target && self.owns(user_id)))
    }

    async fn shortest_path(
        &self,
        _root: &GraphNode,
        _target: &GraphNode,
    ) -> Result<Vec<PathStep>, Error> {
        if let Some(ref message) = self.path_error {
            return Err(Error::storage(message.clone()));
        }
        Ok(self.path.clone())
    }

    async fn find_any_node(&self, user_id: &str) -> Result<Option<GraphNode>, Error> {
        self.fallback_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.any_node.clone().filter(|_| self.owns(user_id)))
    }
}
