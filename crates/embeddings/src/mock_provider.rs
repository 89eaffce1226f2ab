//! Mock embedding provider for testing

use crate::provider::EmbeddingProvider;
use async_trait::async_trait;
use hybridrag_core::error::{Error, Result};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Mock embedding provider that returns dummy embeddings
pub struct MockEmbeddingProvider {
    embedding_dim: usize,
    fail: bool,
    calls: AtomicUsize,
}

impl MockEmbeddingProvider {
    /// Create a new mock provider with specified embedding dimension
    pub fn new(embedding_dim: usize) -> Self {
        Self {
            embedding_dim,
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// Create a mock provider whose every call fails
    pub fn failing(embedding_dim: usize) -> Self {
        Self {
            fail: true,
            ..Self::new(embedding_dim)
        }
    }

    /// Number of `embed` calls made so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Option<Vec<f32>>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::embedding("mock provider configured to fail"));
        }

        // Length-seeded vectors so different texts give different embeddings
        Ok(texts
            .into_iter()
            .map(|text| {
                let seed = text.len() as f32;
                Some(
                    (0..self.embedding_dim)
                        .map(|i| ((seed + i as f32) * 0.01).sin())
                        .collect(),
                )
            })
            .collect())
    }

    fn embedding_dimension(&self) -> usize {
        self.embedding_dim
    }
}
