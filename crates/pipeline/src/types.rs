//! Public API types for the answering pipeline

use crate::error::PipelineError;
use hybridrag_core::{Chunk, Origin, RankMeta};
use hybridrag_reranking::RerankTier;
use serde::{Deserialize, Serialize};

/// Maximum query length to prevent excessive token consumption
const MAX_QUERY_LENGTH: usize = 10000;

/// A question asked on behalf of one user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerRequest {
    pub query: String,
    pub user_id: String,
    /// Chunks handed to generation; the configured default when absent
    #[serde(default)]
    pub top_k: Option<usize>,
}

impl AnswerRequest {
    pub fn new(query: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            user_id: user_id.into(),
            top_k: None,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }

    /// Validate the request, checking query constraints
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.query.trim().is_empty() {
            return Err(PipelineError::InvalidRequest(
                "Query cannot be empty".to_string(),
            ));
        }
        if self.query.chars().count() > MAX_QUERY_LENGTH {
            return Err(PipelineError::InvalidRequest(format!(
                "Query exceeds maximum length of {MAX_QUERY_LENGTH} characters"
            )));
        }
        if self.user_id.trim().is_empty() {
            return Err(PipelineError::InvalidRequest(
                "User id cannot be empty".to_string(),
            ));
        }
        if self.top_k == Some(0) {
            return Err(PipelineError::InvalidRequest(
                "top_k must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Answer with its citations and the chunks it was generated from
#[derive(Debug, Clone, Serialize)]
pub struct AnswerResponse {
    pub answer: String,
    /// Source ids cited in the answer, in order of first appearance
    pub citations: Vec<String>,
    pub chunks: Vec<ChunkDebug>,
    pub metadata: AnswerMetadata,
}

/// Per-chunk debugging view
#[derive(Debug, Clone, Serialize)]
pub struct ChunkDebug {
    pub id: String,
    pub origin: Origin,
    pub score: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank_meta: Option<RankMeta>,
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl From<&Chunk> for ChunkDebug {
    fn from(chunk: &Chunk) -> Self {
        Self {
            id: chunk.id().to_string(),
            origin: chunk.origin(),
            score: chunk.score,
            rank_meta: chunk.rank_meta().cloned(),
            metadata: chunk.metadata.clone(),
        }
    }
}

/// How the answer was assembled
#[derive(Debug, Clone, Serialize)]
pub struct AnswerMetadata {
    pub vector_count: usize,
    pub graph_count: usize,
    /// Chunks left after merging and deduplication
    pub merged_count: usize,
    pub rerank_tier: RerankTier,
    pub query_time_ms: u64,
}
