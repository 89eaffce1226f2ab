//! Tests for terminal and JSON rendering of answers

use hybridrag::{render_answer, Config};
use hybridrag_pipeline::{AnswerMetadata, AnswerResponse};
use hybridrag_reranking::RerankTier;
use pretty_assertions::assert_eq;
use std::io::Write;

fn response(citations: &[&str]) -> AnswerResponse {
    AnswerResponse {
        answer: "Refunds take 5 days [Source: c1].\n".to_string(),
        citations: citations.iter().map(|c| c.to_string()).collect(),
        chunks: Vec::new(),
        metadata: AnswerMetadata {
            vector_count: 10,
            graph_count: 1,
            merged_count: 11,
            rerank_tier: RerankTier::Race,
            query_time_ms: 812,
        },
    }
}

#[test]
fn test_text_rendering_lists_sources() {
    let rendered = render_answer(&response(&["c1", "graph:d1:n3"]), false).unwrap();
    assert_eq!(
        rendered,
        "Refunds take 5 days [Source: c1].\n\
         \n\
         Sources:\n  \
         - c1\n  \
         - graph:d1:n3\n\
         \n\
         (10 vector + 1 graph chunks, 11 merged, reranked by race, 812ms)"
    );
}

#[test]
fn test_text_rendering_without_citations() {
    let rendered = render_answer(&response(&[]), false).unwrap();
    assert!(!rendered.contains("Sources:"));
}

#[test]
fn test_json_rendering_includes_metadata() {
    let rendered = render_answer(&response(&["c1"]), true).unwrap();
    let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
    assert_eq!(value["citations"][0], "c1");
    assert_eq!(value["metadata"]["rerank_tier"], "race");
    assert_eq!(value["metadata"]["merged_count"], 11);
}

#[test]
fn test_config_file_loads() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        file,
        "[retrieval]\nvector_top_k = 20\n\n[generation]\ntop_k = 3"
    )
    .unwrap();

    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.retrieval.vector_top_k, 20);
    assert_eq!(config.generation.top_k, 3);
}
