use hybridrag_core::config::{Config, RerankerConfig, StorageConfig};

#[test]
fn test_storage_config_defaults() {
    let config = StorageConfig::default();
    assert_eq!(config.qdrant_host, "localhost");
    assert_eq!(config.qdrant_port, 6334);
    assert_eq!(config.collection_name, "chunks");
    assert_eq!(config.neo4j_bolt_port, 7687);
    assert_eq!(config.similarity_index, "node_embeddings");
}

#[test]
fn test_default_config_is_valid() {
    assert!(Config::default().validate().is_ok());
}

#[test]
fn test_secondary_reranker_validated() {
    let mut config = Config::default();
    config.reranking.secondary = Some(RerankerConfig {
        name: None,
        provider: "vllm".to_string(),
        model: String::new(),
        api_base_url: None,
        api_key: None,
    });

    let result = config.validate();
    assert!(result.is_err());
    assert!(result
        .unwrap_err()
        .to_string()
        .contains("reranker model cannot be empty"));
}

#[test]
fn test_vector_top_k_bounds() {
    let mut config = Config::default();

    config.retrieval.vector_top_k = 1;
    assert!(config.validate().is_ok());

    config.retrieval.vector_top_k = 0;
    assert!(config.validate().is_err());

    config.retrieval.vector_top_k = 1001;
    assert!(config.validate().is_err());
}
