//! Tests for reranker construction and the HTTP adapters

use hybridrag_core::config::{RerankerConfig, RerankingConfig};
use hybridrag_reranking::{create_fallback_reranker, create_reranker, Reranker};

/// Helper to create a vLLM strategy entry for tests
fn vllm_strategy() -> RerankerConfig {
    RerankerConfig {
        name: Some("bge".to_string()),
        provider: "vllm".to_string(),
        model: "BAAI/bge-reranker-v2-m3".to_string(),
        api_base_url: Some("http://localhost:8001/v1".to_string()),
        api_key: None,
    }
}

fn settings() -> RerankingConfig {
    RerankingConfig {
        timeout_secs: 30,
        ..RerankingConfig::default()
    }
}

/// Test reranker handles empty documents without a request
#[tokio::test]
async fn test_reranker_handles_empty_documents() {
    let reranker = create_reranker(&vllm_strategy(), &settings())
        .await
        .expect("Failed to create reranker");

    assert_eq!(reranker.name(), "bge");
    let order = reranker.rerank("test query", &[]).await.unwrap();
    assert!(order.is_empty());
}

#[tokio::test]
async fn test_jina_without_key_fails_before_any_request() {
    if std::env::var("JINA_API_KEY").is_ok() {
        return;
    }
    let strategy = RerankerConfig {
        name: None,
        provider: "jina".to_string(),
        model: "jina-reranker-v2-base-multilingual".to_string(),
        api_base_url: None,
        api_key: None,
    };

    let err = create_reranker(&strategy, &settings()).await.err().unwrap();
    assert!(err.is_config());
    assert!(err.to_string().contains("JINA_API_KEY"));
}

#[tokio::test]
async fn test_missing_secondary_key_fails_whole_chain() {
    if std::env::var("ANTHROPIC_API_KEY").is_ok() {
        return;
    }
    let config = RerankingConfig {
        secondary: Some(RerankerConfig {
            name: Some("listwise".to_string()),
            provider: "llm".to_string(),
            model: "claude-haiku-4-5".to_string(),
            api_base_url: None,
            api_key: None,
        }),
        ..settings()
    };

    let err = create_fallback_reranker(&config).await.err().unwrap();
    assert!(err.is_config());
}

/// Test reranker ranks a relevant document first
///
/// This test requires a running vLLM reranker instance and is ignored by default.
/// Run with: cargo test --package hybridrag-reranking -- --ignored
#[tokio::test]
#[ignore]
async fn test_vllm_ranks_relevant_document_first() {
    let reranker = create_reranker(&vllm_strategy(), &settings())
        .await
        .expect("Failed to create reranker");

    let documents = [
        "The cafeteria opens at 8am on weekdays.",
        "Refunds are issued within five business days of approval.",
        "Parking permits renew every January.",
    ];
    let order = reranker
        .rerank("How long do refunds take?", &documents)
        .await
        .unwrap();

    assert_eq!(order.len(), documents.len());
    assert_eq!(order[0], 1);
}
