//! OpenAI-compatible API provider for embeddings (vLLM, TEI, OpenAI, etc.)

use crate::{error::EmbeddingError, provider::EmbeddingProvider};
use async_openai::types::{CreateEmbeddingRequest, EmbeddingInput};
use async_openai::{config::OpenAIConfig, Client};
use async_trait::async_trait;
use hybridrag_core::config::EmbeddingsConfig;
use hybridrag_core::error::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

const DEFAULT_BASE_URL: &str = "http://localhost:8000/v1";

/// Backoff ceiling between retries
const MAX_BACKOFF_MS: u64 = 4000;

/// OpenAI-compatible API provider
pub struct OpenAiApiProvider {
    client: Client<OpenAIConfig>,
    model: String,
    dimensions: usize,
    concurrency_limiter: Arc<Semaphore>,
    retry_attempts: usize,
    /// Instruction prefix for query embeddings (BGE format: `<instruct>{instruction}\n<query>{text}`)
    query_instruction: Option<String>,
}

impl OpenAiApiProvider {
    /// Create a new API provider from configuration
    pub(crate) fn new(config: &EmbeddingsConfig, api_key: Option<String>) -> Result<Self> {
        if config.embedding_dimension == 0 {
            return Err(EmbeddingError::ConfigError(
                "embedding_dimension must be greater than 0".to_string(),
            )
            .into());
        }
        if config.max_concurrent_api_requests == 0 {
            return Err(EmbeddingError::ConfigError(
                "max_concurrent_api_requests must be greater than 0".to_string(),
            )
            .into());
        }

        let base_url = config
            .api_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        info!("Initializing OpenAI-compatible API embeddings");
        info!("  Model: {}", config.model);
        info!("  Dimensions: {}", config.embedding_dimension);
        info!("  Base URL: {base_url}");
        info!(
            "  Max concurrent requests: {}",
            config.max_concurrent_api_requests
        );
        info!("  Retry attempts: {}", config.retry_attempts);

        let mut openai_config = OpenAIConfig::new().with_api_base(&base_url);
        if let Some(ref key) = api_key {
            openai_config = openai_config.with_api_key(key);
        }

        Ok(Self {
            client: Client::with_config(openai_config),
            model: config.model.clone(),
            dimensions: config.embedding_dimension,
            concurrency_limiter: Arc::new(Semaphore::new(config.max_concurrent_api_requests)),
            retry_attempts: config.retry_attempts,
            query_instruction: config.query_instruction.clone(),
        })
    }

    fn format_query(&self, query: &str) -> String {
        match self.query_instruction {
            Some(ref instruction) => format!("<instruct>{instruction}\n<query>{query}"),
            None => query.to_string(),
        }
    }

    async fn request_batch(
        &self,
        texts: Vec<String>,
    ) -> std::result::Result<Vec<Vec<f32>>, EmbeddingError> {
        let _permit = self.concurrency_limiter.acquire().await.map_err(|e| {
            EmbeddingError::InferenceError(format!("Failed to acquire concurrency permit: {e}"))
        })?;

        let mut attempt = 0;
        loop {
            let request = CreateEmbeddingRequest {
                model: self.model.clone(),
                input: EmbeddingInput::StringArray(texts.clone()),
                encoding_format: None,
                dimensions: None,
                user: None,
            };

            match self.client.embeddings().create(request).await {
                Ok(response) => {
                    let mut sorted: Vec<(usize, Vec<f32>)> = response
                        .data
                        .into_iter()
                        .map(|emb| (emb.index as usize, emb.embedding))
                        .collect();
                    sorted.sort_by_key(|(idx, _)| *idx);

                    if sorted.len() != texts.len() {
                        return Err(EmbeddingError::InferenceError(format!(
                            "Expected {} embeddings, got {}",
                            texts.len(),
                            sorted.len()
                        )));
                    }

                    for (_, embedding) in &sorted {
                        if embedding.len() != self.dimensions {
                            return Err(EmbeddingError::InferenceError(format!(
                                "Dimension mismatch: expected {}, got {}",
                                self.dimensions,
                                embedding.len()
                            )));
                        }
                    }

                    return Ok(sorted.into_iter().map(|(_, emb)| emb).collect());
                }
                Err(e) if attempt < self.retry_attempts => {
                    attempt += 1;
                    let backoff_ms = (250 * 2u64.pow(attempt as u32)).min(MAX_BACKOFF_MS);
                    warn!(
                        "Embedding request failed: {e}; retrying in {backoff_ms}ms (attempt {attempt}/{})",
                        self.retry_attempts
                    );
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                }
                Err(e) => {
                    return Err(EmbeddingError::InferenceError(format!(
                        "API request failed after {} attempts: {e}",
                        attempt + 1
                    )));
                }
            }
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiApiProvider {
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Option<Vec<f32>>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Embedding {} texts with {}", texts.len(), self.model);
        let embeddings = self.request_batch(texts).await?;
        Ok(embeddings.into_iter().map(Some).collect())
    }

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
        let mut embeddings = self.request_batch(vec![self.format_query(query)]).await?;
        embeddings.pop().ok_or_else(|| {
            EmbeddingError::InferenceError("Empty embedding response".to_string()).into()
        })
    }

    fn embedding_dimension(&self) -> usize {
        self.dimensions
    }
}

/// Create a new OpenAI-compatible API provider from configuration
pub fn create_api_provider(
    config: &EmbeddingsConfig,
    api_key: Option<String>,
) -> Result<Box<dyn EmbeddingProvider>> {
    let provider = OpenAiApiProvider::new(config, api_key)?;
    Ok(Box::new(provider))
}
