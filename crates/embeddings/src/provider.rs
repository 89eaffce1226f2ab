//! Trait definition for embedding providers

use async_trait::async_trait;
use hybridrag_core::error::{Error, Result};

/// Trait for embedding providers
///
/// This trait defines the interface that all embedding providers must implement.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate embeddings for a list of texts
    ///
    /// # Arguments
    /// * `texts` - List of text strings to embed
    ///
    /// # Returns
    /// One optional vector per input text. `None` marks a text the provider
    /// skipped (for example because it exceeds the model's context window).
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Option<Vec<f32>>>>;

    /// Generate the embedding for a single search query
    ///
    /// Providers that distinguish queries from passages override this to
    /// apply their query formatting.
    async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
        self.embed(vec![query.to_string()])
            .await?
            .into_iter()
            .next()
            .flatten()
            .ok_or_else(|| Error::embedding("Provider returned no embedding for query"))
    }

    /// Get the embedding dimension
    fn embedding_dimension(&self) -> usize;
}
