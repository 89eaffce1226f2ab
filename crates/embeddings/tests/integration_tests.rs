//! Integration tests against a live OpenAI-compatible embeddings endpoint
//!
//! Run with: cargo test -p hybridrag-embeddings -- --ignored
//! Requires an embeddings server at EMBEDDING_API_BASE_URL (default http://localhost:8000/v1).

use hybridrag_core::config::EmbeddingsConfig;
use hybridrag_embeddings::create_embedding_manager_from_app_config;

fn live_config() -> EmbeddingsConfig {
    EmbeddingsConfig {
        api_base_url: std::env::var("EMBEDDING_API_BASE_URL")
            .ok()
            .or_else(|| EmbeddingsConfig::default().api_base_url),
        ..EmbeddingsConfig::default()
    }
}

#[tokio::test]
#[ignore]
async fn test_live_query_embedding_has_configured_dimension() {
    let config = live_config();
    let manager = create_embedding_manager_from_app_config(&config).unwrap();

    let vector = manager
        .embed_query("Which documents describe the billing service?")
        .await
        .unwrap();

    assert_eq!(vector.len(), config.embedding_dimension);
}

#[tokio::test]
#[ignore]
async fn test_live_different_queries_give_different_vectors() {
    let manager = create_embedding_manager_from_app_config(&live_config()).unwrap();

    let a = manager.embed_query("database migrations").await.unwrap();
    let b = manager.embed_query("holiday schedule").await.unwrap();

    assert_ne!(a, b);
}
