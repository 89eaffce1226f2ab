//! End-to-end answering tests over in-memory collaborators

use hybridrag_core::RetrievalConfig;
use hybridrag_embeddings::{EmbeddingManager, MockEmbeddingProvider};
use hybridrag_pipeline::{
    AnswerRequest, Generator, MockGenerator, PipelineError, RagPipeline,
    INSUFFICIENT_CONTEXT_ANSWER,
};
use hybridrag_reranking::{
    FallbackReranker, MockReranker, MockRerankerBehavior, RerankRace, RerankTier, Reranker,
};
use hybridrag_storage::{
    GraphNode, GraphStore, MockGraphStore, MockVectorIndex, PathStep, VectorIndex, VectorMatch,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

const USER: &str = "u1";
const DIM: usize = 8;

fn vector_match(id: &str, text: &str, score: f32) -> VectorMatch {
    VectorMatch {
        id: id.to_string(),
        score,
        metadata: json!({ "text": text, "doc_label": "Billing Handbook" })
            .as_object()
            .cloned()
            .unwrap_or_default(),
    }
}

fn ten_matches() -> Vec<VectorMatch> {
    (0..10)
        .map(|i| vector_match(&format!("c{i}"), &format!("passage {i}"), 0.9 - i as f32 * 0.05))
        .collect()
}

fn handbook_graph() -> MockGraphStore {
    let target = GraphNode::new("n3", "Paragraph", "Refunds take 5 days");
    let root = GraphNode::new("d1", "Document", "Billing Handbook");
    MockGraphStore::new(USER).with_target(target.clone()).with_root(
        root.clone(),
        vec![
            PathStep::from(&root),
            PathStep::new("Section", "Refunds"),
            PathStep::from(&target),
        ],
    )
}

fn chain(strategies: Vec<Arc<dyn Reranker>>, secondary: Option<Arc<dyn Reranker>>) -> FallbackReranker {
    FallbackReranker::new(
        RerankRace::new(strategies, Duration::from_millis(500)),
        secondary,
        Duration::from_secs(2),
    )
}

struct Harness {
    embeddings: Arc<MockEmbeddingProvider>,
    vector_index: Arc<dyn VectorIndex>,
    graph_store: Arc<dyn GraphStore>,
    reranker: FallbackReranker,
    generator: Arc<MockGenerator>,
}

impl Harness {
    fn new() -> Self {
        Self {
            embeddings: Arc::new(MockEmbeddingProvider::new(DIM)),
            vector_index: Arc::new(MockVectorIndex::new().with_namespace(USER, ten_matches())),
            graph_store: Arc::new(handbook_graph()),
            reranker: chain(
                vec![Arc::new(MockReranker::new("reverse", MockRerankerBehavior::Reverse))],
                None,
            ),
            generator: Arc::new(MockGenerator::citing_sources()),
        }
    }

    fn build(self) -> (RagPipeline, Arc<MockGenerator>, Arc<MockEmbeddingProvider>) {
        let generator = Arc::clone(&self.generator);
        let embeddings = Arc::clone(&self.embeddings);
        let manager = EmbeddingManager::new(self.embeddings, "mock".to_string());
        let pipeline = RagPipeline::new(
            Arc::new(manager),
            self.vector_index,
            self.graph_store,
            self.reranker,
            self.generator as Arc<dyn Generator>,
            RetrievalConfig {
                vector_top_k: 10,
                namespace_prefix: String::new(),
            },
            5,
        );
        (pipeline, generator, embeddings)
    }
}

#[tokio::test]
async fn test_answer_end_to_end_with_race_winner() {
    let (pipeline, generator, embeddings) = Harness::new().build();

    let response = tokio_test::assert_ok!(
        pipeline
            .answer(AnswerRequest::new("How long do refunds take?", USER))
            .await
    );

    assert_eq!(embeddings.call_count(), 1);
    assert_eq!(generator.call_count(), 1);
    assert_eq!(response.metadata.vector_count, 10);
    assert_eq!(response.metadata.graph_count, 1);
    assert_eq!(response.metadata.merged_count, 11);
    assert_eq!(response.metadata.rerank_tier, RerankTier::Race);

    // Reverse ordering puts the graph chunk (merged last) first
    let ids: Vec<&str> = response.chunks.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["graph:d1:n3", "c9", "c8", "c7", "c6"]);
    assert_eq!(
        response.chunks[0].rank_meta.as_ref().map(|m| m.winner_strategy.as_str()),
        Some("reverse")
    );
    assert!(response.chunks[1..].iter().all(|c| c.rank_meta.is_none()));

    assert_eq!(response.citations, ids);
    assert!(response.answer.contains("[Source: graph:d1:n3]"));
}

#[tokio::test]
async fn test_request_top_k_overrides_default() {
    let (pipeline, _, _) = Harness::new().build();

    let response = pipeline
        .answer(AnswerRequest::new("refunds", USER).with_top_k(2))
        .await
        .unwrap();

    assert_eq!(response.chunks.len(), 2);
    assert_eq!(response.citations.len(), 2);
}

#[tokio::test]
async fn test_invalid_request_is_rejected_before_retrieval() {
    let (pipeline, generator, embeddings) = Harness::new().build();

    let result = pipeline.answer(AnswerRequest::new("  ", USER)).await;

    assert!(matches!(result, Err(PipelineError::InvalidRequest(_))));
    assert_eq!(embeddings.call_count(), 0);
    assert_eq!(generator.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_secondary_reranker_orders_when_race_fails() {
    let mut harness = Harness::new();
    harness.reranker = chain(
        vec![
            Arc::new(MockReranker::new("jina", MockRerankerBehavior::Fail("503".to_string()))),
            Arc::new(MockReranker::new("llm", MockRerankerBehavior::Hang)),
        ],
        Some(Arc::new(MockReranker::new(
            "secondary",
            MockRerankerBehavior::Order(vec![10, 2, 4]),
        ))),
    );
    let (pipeline, _, _) = harness.build();

    let started = tokio::time::Instant::now();
    let response = pipeline.answer(AnswerRequest::new("refunds", USER)).await.unwrap();

    // The failing strategy ends the race without waiting for the deadline
    assert!(started.elapsed() < Duration::from_millis(500));
    assert_eq!(response.metadata.rerank_tier, RerankTier::Secondary);
    let ids: Vec<&str> = response.chunks.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["graph:d1:n3", "c2", "c4"]);
    assert!(response.chunks.iter().all(|c| c.rank_meta.is_none()));
}

#[tokio::test]
async fn test_single_failing_strategy_reaches_score_sort() {
    let mut harness = Harness::new();
    harness.reranker = chain(
        vec![Arc::new(MockReranker::new("llm", MockRerankerBehavior::Unparseable))],
        None,
    );
    let (pipeline, _, _) = harness.build();

    let response = pipeline.answer(AnswerRequest::new("refunds", USER)).await.unwrap();

    assert_eq!(response.metadata.rerank_tier, RerankTier::ScoreSort);
    // Vector scores descend from 0.9; the graph chunk has no score
    let ids: Vec<&str> = response.chunks.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["c0", "c1", "c2", "c3", "c4"]);
}

#[tokio::test]
async fn test_empty_retrieval_short_circuits_generation() {
    let mut harness = Harness::new();
    harness.vector_index = Arc::new(MockVectorIndex::new());
    harness.graph_store = Arc::new(MockGraphStore::new("someone-else"));
    let (pipeline, generator, _) = harness.build();

    let response = pipeline.answer(AnswerRequest::new("refunds", USER)).await.unwrap();

    assert_eq!(response.answer, INSUFFICIENT_CONTEXT_ANSWER);
    assert!(response.citations.is_empty());
    assert!(response.chunks.is_empty());
    assert_eq!(response.metadata.rerank_tier, RerankTier::None);
    assert_eq!(generator.call_count(), 0);
}

#[tokio::test]
async fn test_total_collaborator_failure_still_answers() {
    let mut harness = Harness::new();
    harness.embeddings = Arc::new(MockEmbeddingProvider::failing(DIM));
    harness.generator = Arc::new(MockGenerator::failing("unreachable"));
    let (pipeline, generator, _) = harness.build();

    let response = pipeline.answer(AnswerRequest::new("refunds", USER)).await.unwrap();

    assert_eq!(response.answer, INSUFFICIENT_CONTEXT_ANSWER);
    assert!(response.citations.is_empty());
    assert_eq!(response.metadata.merged_count, 0);
    assert_eq!(generator.call_count(), 0);
}

#[tokio::test]
async fn test_vector_failure_leaves_graph_branch() {
    let mut harness = Harness::new();
    harness.vector_index = Arc::new(MockVectorIndex::failing("qdrant unavailable"));
    let (pipeline, _, _) = harness.build();

    let response = pipeline.answer(AnswerRequest::new("refunds", USER)).await.unwrap();

    assert_eq!(response.metadata.vector_count, 0);
    assert_eq!(response.metadata.graph_count, 1);
    // A single chunk is returned as-is without reranking
    assert_eq!(response.metadata.rerank_tier, RerankTier::None);
    assert_eq!(response.citations, vec!["graph:d1:n3"]);
}

#[tokio::test]
async fn test_missing_similarity_index_uses_unranked_node() {
    let mut harness = Harness::new();
    harness.vector_index = Arc::new(MockVectorIndex::new());
    harness.graph_store = Arc::new(
        MockGraphStore::new(USER)
            .with_similarity_error("Index not found: node_embeddings")
            .with_any_node(GraphNode::new("n7", "Section", "Shipping")),
    );
    let (pipeline, _, _) = harness.build();

    let response = pipeline.answer(AnswerRequest::new("shipping", USER)).await.unwrap();

    assert_eq!(response.metadata.graph_count, 1);
    assert_eq!(response.chunks.len(), 1);
    assert_eq!(response.chunks[0].id, "graph:n7");
    assert!(response.chunks[0].metadata.get("path_length").is_none());
}

#[tokio::test]
async fn test_duplicate_ids_across_branches_keep_vector_copy() {
    let mut harness = Harness::new();
    let mut matches = ten_matches();
    matches[9] = vector_match("graph:d1:n3", "vector copy", 0.1);
    harness.vector_index = Arc::new(MockVectorIndex::new().with_namespace(USER, matches));
    let (pipeline, _, _) = harness.build();

    let response = pipeline
        .answer(AnswerRequest::new("refunds", USER).with_top_k(20))
        .await
        .unwrap();

    assert_eq!(response.metadata.vector_count, 10);
    assert_eq!(response.metadata.graph_count, 1);
    assert_eq!(response.metadata.merged_count, 10);
    let duplicate = response
        .chunks
        .iter()
        .find(|c| c.id == "graph:d1:n3")
        .map(|c| c.origin);
    assert_eq!(duplicate, Some(hybridrag_core::Origin::Vector));
}

#[tokio::test(start_paused = true)]
async fn test_hanging_strategies_bounded_by_deadline() {
    let mut harness = Harness::new();
    harness.reranker = chain(
        vec![
            Arc::new(MockReranker::new("a", MockRerankerBehavior::Hang)),
            Arc::new(MockReranker::new("b", MockRerankerBehavior::Hang)),
        ],
        None,
    );
    let (pipeline, _, _) = harness.build();

    let started = tokio::time::Instant::now();
    let response = pipeline.answer(AnswerRequest::new("refunds", USER)).await.unwrap();

    assert!(started.elapsed() <= Duration::from_millis(505));
    assert_eq!(response.metadata.rerank_tier, RerankTier::ScoreSort);
    assert_eq!(response.chunks.len(), 5);
}
