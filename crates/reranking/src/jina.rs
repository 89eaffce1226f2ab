//! Jina AI reranker provider

use crate::error::RerankingError;
use crate::{sort_scores_descending, truncate_for_reranking, Reranker, MAX_DOCUMENT_CHARS};
use async_trait::async_trait;
use futures::future::join_all;
use hybridrag_core::error::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

const JINA_API_URL: &str = "https://api.jina.ai/v1/rerank";

/// Maximum documents per batch to avoid timeouts with large payloads
const BATCH_SIZE: usize = 25;

/// Request payload for Jina rerank API
#[derive(Debug, Serialize)]
struct JinaRerankRequest {
    model: String,
    query: String,
    documents: Vec<String>,
    top_n: usize,
    return_documents: bool,
}

/// Response from Jina rerank API
#[derive(Debug, Deserialize)]
struct JinaRerankResponse {
    results: Vec<JinaRerankResult>,
}

/// Individual rerank result from Jina
#[derive(Debug, Deserialize)]
struct JinaRerankResult {
    index: usize,
    relevance_score: f32,
}

/// Jina AI reranker provider
pub struct JinaReranker {
    name: String,
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
    concurrency_limiter: Arc<Semaphore>,
}

impl JinaReranker {
    /// Create a new Jina reranker
    ///
    /// # Arguments
    /// * `name` - Strategy name reported when this reranker wins a race
    /// * `api_key` - Jina API key for authentication
    /// * `model` - Model name (e.g., "jina-reranker-v2-base-multilingual")
    /// * `api_base_url` - Optional base URL replacing the public Jina endpoint
    /// * `timeout_secs` - Request timeout in seconds
    /// * `max_concurrent_requests` - Maximum concurrent API requests
    pub fn new(
        name: String,
        api_key: String,
        model: String,
        api_base_url: Option<String>,
        timeout_secs: u64,
        max_concurrent_requests: usize,
    ) -> Result<Self> {
        let endpoint = api_base_url
            .map(|base| format!("{}/rerank", base.trim_end_matches('/')))
            .unwrap_or_else(|| JINA_API_URL.to_string());

        info!("Initializing Jina reranker provider");
        info!("  Model: {model}");
        info!("  Endpoint: {endpoint}");
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
            api_key,
            model,
            endpoint,
            concurrency_limiter: Arc::new(Semaphore::new(max_concurrent_requests)),
        })
    }

    /// Rerank a single batch of documents
    ///
    /// `offset` is the position of the batch's first document in the full
    /// input; returned indices are absolute.
    async fn rerank_batch(
        &self,
        query: &str,
        batch: &[&str],
        offset: usize,
    ) -> std::result::Result<Vec<(usize, f32)>, RerankingError> {
        let request = JinaRerankRequest {
            model: self.model.clone(),
            query: query.to_string(),
            documents: batch
                .iter()
                .map(|doc| truncate_for_reranking(doc, MAX_DOCUMENT_CHARS))
                .collect(),
            top_n: batch.len(),
            return_documents: false,
        };

        // Acquire semaphore permit for concurrency control
        let _permit = self.concurrency_limiter.acquire().await.map_err(|e| {
            RerankingError::InferenceError(format!("Failed to acquire concurrency permit: {e}"))
        })?;

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                let error_kind = if e.is_timeout() {
                    "timeout"
                } else if e.is_connect() {
                    "connection"
                } else {
                    "request"
                };
                RerankingError::InferenceError(format!(
                    "Jina rerank batch at {offset} failed ({error_kind}): {e}"
                ))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(RerankingError::InferenceError(format!(
                "Jina rerank returned error {status}: {error_text}"
            )));
        }

        let rerank_response: JinaRerankResponse = response.json().await.map_err(|e| {
            RerankingError::ParseError(format!("Failed to parse Jina rerank response: {e}"))
        })?;

        Ok(rerank_response
            .results
            .into_iter()
            .filter_map(|result| {
                if result.index < batch.len() {
                    Some((offset + result.index, result.relevance_score))
                } else {
                    warn!(
                        "Jina returned out-of-bounds index {} for batch of {}, dropping",
                        result.index,
                        batch.len()
                    );
                    None
                }
            })
            .collect())
    }
}

#[async_trait]
impl Reranker for JinaReranker {
    fn name(&self) -> &str {
        &self.name
    }

    async fn rerank(&self, query: &str, documents: &[&str]) -> Result<Vec<usize>> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let num_batches = documents.len().div_ceil(BATCH_SIZE);
        debug!(
            "Jina rerank: {} documents in {num_batches} batches",
            documents.len()
        );

        // Batches are polled in place so dropping this future cancels them all
        let batch_results = join_all(
            documents
                .chunks(BATCH_SIZE)
                .enumerate()
                .map(|(batch_idx, batch)| self.rerank_batch(query, batch, batch_idx * BATCH_SIZE)),
        )
        .await;

        let mut all_scored: Vec<(usize, f32)> = Vec::with_capacity(documents.len());
        let mut last_error = None;
        let mut failed_batches = 0;

        for result in batch_results {
            match result {
                Ok(scored) => all_scored.extend(scored),
                Err(e) => {
                    warn!("{e}");
                    failed_batches += 1;
                    last_error = Some(e);
                }
            }
        }

        if failed_batches == num_batches {
            if let Some(e) = last_error {
                return Err(e.into());
            }
        } else if failed_batches > 0 {
            warn!("Jina rerank: {failed_batches}/{num_batches} batches failed, returning partial results");
        }

        // Cross-encoder scores are absolute, so batches merge by score
        sort_scores_descending(&mut all_scored);

        Ok(all_scored.into_iter().map(|(index, _)| index).collect())
    }
}
