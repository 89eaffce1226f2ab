//! vLLM-compatible reranker provider

use crate::error::RerankingError;
use crate::{sort_scores_descending, truncate_for_reranking, Reranker, MAX_DOCUMENT_CHARS};
use async_trait::async_trait;
use hybridrag_core::error::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// Request payload for vLLM rerank API
#[derive(Debug, Serialize)]
struct RerankRequest {
    model: String,
    query: String,
    documents: Vec<String>,
}

/// Response from vLLM rerank API
#[derive(Debug, Deserialize)]
struct RerankResponse {
    results: Vec<RerankResult>,
}

/// Individual rerank result
#[derive(Debug, Deserialize)]
struct RerankResult {
    index: usize,
    relevance_score: f32,
}

/// vLLM-compatible reranker provider
pub struct VllmReranker {
    name: String,
    client: Client,
    model: String,
    api_base_url: String,
    concurrency_limiter: Arc<Semaphore>,
}

impl VllmReranker {
    /// Create a new vLLM reranker
    ///
    /// # Arguments
    /// * `name` - Strategy name reported when this reranker wins a race
    /// * `model` - Model name (e.g., "BAAI/bge-reranker-v2-m3")
    /// * `api_base_url` - Base URL for the vLLM API (e.g., "http://localhost:8001/v1")
    /// * `timeout_secs` - Request timeout in seconds
    /// * `max_concurrent_requests` - Maximum concurrent API requests
    pub fn new(
        name: String,
        model: String,
        api_base_url: String,
        timeout_secs: u64,
        max_concurrent_requests: usize,
    ) -> Result<Self> {
        info!("Initializing vLLM reranker provider");
        info!("  Model: {model}");
        info!("  API Base URL: {api_base_url}");
        info!("  Timeout: {timeout_secs}s");
        info!("  Max concurrent requests: {max_concurrent_requests}");

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| {
                RerankingError::ConfigError(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            name,
            client,
            model,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            concurrency_limiter: Arc::new(Semaphore::new(max_concurrent_requests)),
        })
    }

    /// Check if the reranker API is healthy (non-blocking, warns on failure)
    pub async fn check_health(&self) {
        debug!("Checking reranker API health");

        let models_url = format!("{}/models", self.api_base_url);
        match self.client.get(&models_url).send().await {
            Ok(response) if response.status().is_success() => {
                info!("Reranker API health check passed");
            }
            Ok(response) => {
                warn!(
                    "Reranker API health check failed with status: {}",
                    response.status()
                );
                warn!("  The vLLM reranker service may not be running or still starting up.");
            }
            Err(e) => {
                warn!("Reranker API health check failed: {e}");
                warn!("  The vLLM reranker service may not be running or still starting up.");
            }
        }
    }
}

#[async_trait]
impl Reranker for VllmReranker {
    fn name(&self) -> &str {
        &self.name
    }

    async fn rerank(&self, query: &str, documents: &[&str]) -> Result<Vec<usize>> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let request = RerankRequest {
            model: self.model.clone(),
            query: query.to_string(),
            documents: documents
                .iter()
                .map(|doc| truncate_for_reranking(doc, MAX_DOCUMENT_CHARS))
                .collect(),
        };

        let rerank_url = format!("{}/rerank", self.api_base_url);
        debug!("Sending rerank request for {} documents", documents.len());

        // Acquire semaphore permit for concurrency control
        let _permit = self.concurrency_limiter.acquire().await.map_err(|e| {
            RerankingError::InferenceError(format!("Failed to acquire concurrency permit: {e}"))
        })?;

        let response = self
            .client
            .post(&rerank_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                RerankingError::InferenceError(format!("Rerank API request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(RerankingError::InferenceError(format!(
                "Rerank API returned error {status}: {error_text}"
            ))
            .into());
        }

        let rerank_response: RerankResponse = response.json().await.map_err(|e| {
            RerankingError::ParseError(format!("Failed to parse rerank response: {e}"))
        })?;

        let mut scored: Vec<(usize, f32)> = rerank_response
            .results
            .into_iter()
            .filter_map(|result| {
                if result.index < documents.len() {
                    Some((result.index, result.relevance_score))
                } else {
                    warn!(
                        "Rerank API returned out-of-bounds index {}, dropping result",
                        result.index
                    );
                    None
                }
            })
            .collect();

        sort_scores_descending(&mut scored);

        debug!("Reranking complete: returned {} results", scored.len());

        Ok(scored.into_iter().map(|(index, _)| index).collect())
    }
}
