//! In-memory vector index for testing

use crate::{VectorIndex, VectorMatch};
use async_trait::async_trait;
use hybridrag_core::Error;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Vector index returning canned matches per namespace
#[derive(Default)]
pub struct MockVectorIndex {
    namespaces: HashMap<String, Vec<VectorMatch>>,
    error: Option<String>,
    calls: AtomicUsize,
    last_top_k: AtomicUsize,
}

impl MockVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the matches stored under `namespace`, best first
    pub fn with_namespace(mut self, namespace: impl Into<String>, matches: Vec<VectorMatch>) -> Self {
        self.namespaces.insert(namespace.into(), matches);
        self
    }

    /// Make every query fail with `message`
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// `top_k` of the most recent query
    pub fn last_top_k(&self) -> usize {
        self.last_top_k.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VectorIndex for MockVectorIndex {
    async fn query_namespace(
        &self,
        namespace: &str,
        _vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<VectorMatch>, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.last_top_k.store(top_k, Ordering::SeqCst);

        if let Some(ref message) = self.error {
            return Err(Error::storage(message.clone()));
        }

        Ok(self
            .namespaces
            .get(namespace)
            .map(|matches| matches.iter().take(top_k).cloned().collect())
            .unwrap_or_default())
    }
}
