//! The answering pipeline: embed, retrieve, merge, rerank, generate

use crate::{
    error::{PipelineError, Result},
    generation::generate,
    generator::{create_generator, Generator},
    graph_branch::graph_search,
    merge::merge_results,
    types::{AnswerMetadata, AnswerRequest, AnswerResponse, ChunkDebug},
    vector_branch::vector_search,
};
use hybridrag_core::{Config, RetrievalConfig};
use hybridrag_embeddings::{create_embedding_manager_from_app_config, EmbeddingManager};
use hybridrag_reranking::{create_fallback_reranker, FallbackReranker};
use hybridrag_storage::{create_graph_store, create_vector_index, GraphStore, VectorIndex};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Answers questions over one user's documents at a time.
///
/// Collaborator clients are created once and shared across requests;
/// nothing request-scoped is stored here.
pub struct RagPipeline {
    embeddings: Arc<EmbeddingManager>,
    vector_index: Arc<dyn VectorIndex>,
    graph_store: Arc<dyn GraphStore>,
    reranker: FallbackReranker,
    generator: Arc<dyn Generator>,
    retrieval: RetrievalConfig,
    default_top_k: usize,
}

impl std::fmt::Debug for RagPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RagPipeline")
            .field("embedding_model", &self.embeddings.model_version())
            .field("race_strategies", &self.reranker.race().strategy_count())
            .field("secondary_reranker", &self.reranker.has_secondary())
            .field("retrieval", &self.retrieval)
            .field("default_top_k", &self.default_top_k)
            .finish()
    }
}

impl RagPipeline {
    pub fn new(
        embeddings: Arc<EmbeddingManager>,
        vector_index: Arc<dyn VectorIndex>,
        graph_store: Arc<dyn GraphStore>,
        reranker: FallbackReranker,
        generator: Arc<dyn Generator>,
        retrieval: RetrievalConfig,
        default_top_k: usize,
    ) -> Self {
        Self {
            embeddings,
            vector_index,
            graph_store,
            reranker,
            generator,
            retrieval,
            default_top_k,
        }
    }

    /// Build the pipeline and connect to every collaborator.
    ///
    /// Missing credentials are reported before any connection is attempted.
    pub async fn from_config(config: &Config) -> Result<Self> {
        config
            .validate()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        info!("Initializing answering pipeline");

        let generator = create_generator(&config.generation)?;
        let embeddings = create_embedding_manager_from_app_config(&config.embeddings)
            .map_err(|e| PipelineError::startup("embedding provider", e))?;
        let reranker = create_fallback_reranker(&config.reranking)
            .await
            .map_err(|e| PipelineError::startup("reranker", e))?;

        let vector_index =
            create_vector_index(&config.storage, config.embeddings.embedding_dimension)
                .await
                .map_err(|e| PipelineError::startup("qdrant", e))?;
        let graph_store = create_graph_store(&config.storage)
            .await
            .map_err(|e| PipelineError::startup("neo4j", e))?;

        info!(
            "  Generation: {} ({}), top_k {}",
            config.generation.provider, config.generation.model, config.generation.top_k
        );

        Ok(Self::new(
            embeddings,
            vector_index,
            graph_store,
            reranker,
            generator,
            config.retrieval.clone(),
            config.generation.top_k,
        ))
    }

    /// Answer `request` from the requesting user's documents.
    ///
    /// Only an invalid request is an error. Collaborator failures degrade
    /// the affected stage and the caller still receives an answer.
    pub async fn answer(&self, request: AnswerRequest) -> Result<AnswerResponse> {
        request.validate()?;
        let started = Instant::now();
        let top_k = request.top_k.unwrap_or(self.default_top_k);

        info!(
            "Answering query for user {} (top_k {top_k}): {}",
            request.user_id,
            truncate_for_log(&request.query)
        );

        let (vector_chunks, graph_chunks) = match self.embeddings.embed_query(&request.query).await
        {
            Ok(embedding) => {
                let namespace = self.retrieval.namespace_for(&request.user_id);
                tokio::join!(
                    vector_search(
                        self.vector_index.as_ref(),
                        &embedding,
                        &namespace,
                        self.retrieval.vector_top_k,
                    ),
                    graph_search(self.graph_store.as_ref(), &embedding, &request.user_id),
                )
            }
            Err(e) => {
                warn!("Query embedding failed, retrieving nothing: {e}");
                (Vec::new(), Vec::new())
            }
        };

        let vector_count = vector_chunks.len();
        let graph_count = graph_chunks.len();
        let merged = merge_results(vector_chunks, graph_chunks);
        let merged_count = merged.len();
        debug!("Retrieved {vector_count} vector + {graph_count} graph chunks, {merged_count} after merge");

        let reranked = self
            .reranker
            .rerank_with_fallback(&request.query, merged, top_k)
            .await;

        let generated = generate(
            self.generator.as_ref(),
            &request.query,
            &reranked.chunks,
            top_k,
        )
        .await;

        let query_time_ms = started.elapsed().as_millis() as u64;
        info!(
            "Answered in {query_time_ms}ms via rerank tier '{}' with {} citations",
            reranked.tier,
            generated.citations.len()
        );

        Ok(AnswerResponse {
            answer: generated.answer,
            citations: generated.citations,
            chunks: reranked.chunks.iter().map(ChunkDebug::from).collect(),
            metadata: AnswerMetadata {
                vector_count,
                graph_count,
                merged_count,
                rerank_tier: reranked.tier,
                query_time_ms,
            },
        })
    }
}

fn truncate_for_log(query: &str) -> String {
    const MAX_LOG_CHARS: usize = 120;
    if query.chars().count() <= MAX_LOG_CHARS {
        query.to_string()
    } else {
        let head: String = query.chars().take(MAX_LOG_CHARS).collect();
        format!("{head}...")
    }
}
