//! Query embedding for hybrid retrieval
//!
//! Both retrieval branches search with the same query vector, so the
//! pipeline embeds each question exactly once through an [`EmbeddingManager`].

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

use hybridrag_core::config::EmbeddingsConfig;
use hybridrag_core::error::{Result, ResultExt};
use std::sync::Arc;

mod api_provider;
pub mod error;
mod mock_provider;
pub mod provider;

pub use api_provider::create_api_provider;
pub use error::EmbeddingError;
pub use mock_provider::MockEmbeddingProvider;
pub use provider::EmbeddingProvider;

/// Supported embedding backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingProviderType {
    /// OpenAI-compatible HTTP endpoint
    Api,
    /// Deterministic in-process vectors for tests
    Mock,
}

impl std::str::FromStr for EmbeddingProviderType {
    type Err = EmbeddingError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "api" | "localapi" => Ok(Self::Api),
            "mock" => Ok(Self::Mock),
            other => Err(EmbeddingError::UnsupportedProvider(other.to_string())),
        }
    }
}

/// Create an embedding manager from the application's embeddings section
///
/// Reads the API key from the EMBEDDING_API_KEY environment variable
/// when the config does not specify one.
pub fn create_embedding_manager_from_app_config(
    embeddings_config: &EmbeddingsConfig,
) -> Result<Arc<EmbeddingManager>> {
    let api_key = embeddings_config
        .api_key
        .clone()
        .or_else(|| std::env::var("EMBEDDING_API_KEY").ok());

    let manager = EmbeddingManager::from_config(embeddings_config, api_key)
        .context("Failed to create embedding manager")?;

    Ok(Arc::new(manager))
}

/// Manager for handling embedding generation with immutable configuration
pub struct EmbeddingManager {
    provider: Arc<dyn EmbeddingProvider>,
    model_version: String,
}

impl EmbeddingManager {
    /// Creates a new embedding manager with the specified provider and model version
    pub fn new(provider: Arc<dyn EmbeddingProvider>, model_version: String) -> Self {
        Self {
            provider,
            model_version,
        }
    }

    /// Initialize manager from configuration
    pub fn from_config(config: &EmbeddingsConfig, api_key: Option<String>) -> Result<Self> {
        let provider_type: EmbeddingProviderType = config.provider.parse()?;

        let provider: Arc<dyn EmbeddingProvider> = match provider_type {
            EmbeddingProviderType::Api => Arc::from(create_api_provider(config, api_key)?),
            EmbeddingProviderType::Mock => {
                Arc::new(MockEmbeddingProvider::new(config.embedding_dimension))
            }
        };

        Ok(Self {
            provider,
            model_version: config.model.clone(),
        })
    }

    /// Get reference to the embedding provider
    pub fn provider(&self) -> &dyn EmbeddingProvider {
        self.provider.as_ref()
    }

    /// Get the model version string
    pub fn model_version(&self) -> &str {
        &self.model_version
    }

    /// Generate embeddings for texts
    pub async fn embed(&self, texts: Vec<String>) -> Result<Vec<Option<Vec<f32>>>> {
        self.provider.embed(texts).await
    }

    /// Generate the embedding for a search query
    pub async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
        self.provider.embed_query(query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mock_config() -> EmbeddingsConfig {
        EmbeddingsConfig {
            provider: "mock".to_string(),
            embedding_dimension: 16,
            ..EmbeddingsConfig::default()
        }
    }

    #[test]
    fn test_provider_type_parsing() {
        assert_eq!(
            "API".parse::<EmbeddingProviderType>().unwrap(),
            EmbeddingProviderType::Api
        );
        assert_eq!(
            "mock".parse::<EmbeddingProviderType>().unwrap(),
            EmbeddingProviderType::Mock
        );
        assert!("onnx".parse::<EmbeddingProviderType>().is_err());
    }

    #[tokio::test]
    async fn test_manager_from_mock_config() {
        let manager = EmbeddingManager::from_config(&mock_config(), None).unwrap();
        assert_eq!(manager.model_version(), EmbeddingsConfig::default().model);
        assert_eq!(manager.provider().embedding_dimension(), 16);

        let vector = manager.embed_query("how do chunks merge").await.unwrap();
        assert_eq!(vector.len(), 16);
    }

    #[test]
    fn test_unknown_provider_is_config_error() {
        let config = EmbeddingsConfig {
            provider: "candle".to_string(),
            ..EmbeddingsConfig::default()
        };
        let err = EmbeddingManager::from_config(&config, None).err().unwrap();
        assert!(err.to_string().contains("candle"));
    }

    #[tokio::test]
    async fn test_embed_batch_through_manager() {
        let manager = create_embedding_manager_from_app_config(&mock_config()).unwrap();
        let vectors = manager
            .embed(vec!["a".to_string(), "bb".to_string()])
            .await
            .unwrap();
        assert_eq!(vectors.len(), 2);
        assert!(vectors.iter().all(|v| v.as_ref().map(Vec::len) == Some(16)));
    }
}
