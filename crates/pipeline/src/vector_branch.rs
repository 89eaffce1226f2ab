//! Dense-vector retrieval within a user's namespace

use hybridrag_core::chunk::meta;
use hybridrag_core::Chunk;
use hybridrag_storage::{VectorIndex, VectorMatch};
use tracing::{debug, warn};

/// Payload fields that may hold a chunk's text, in order of preference
const TEXT_FIELDS: [&str; 2] = ["text", "content"];

/// Query the vector index and map every match to a vector-origin chunk.
///
/// Index failures degrade to an empty result.
pub(crate) async fn vector_search(
    index: &dyn VectorIndex,
    embedding: &[f32],
    namespace: &str,
    top_k: usize,
) -> Vec<Chunk> {
    match index.query_namespace(namespace, embedding, top_k).await {
        Ok(matches) => {
            debug!("Vector branch: {} matches in {namespace}", matches.len());
            matches.into_iter().map(match_to_chunk).collect()
        }
        Err(e) => {
            warn!("Vector branch failed for namespace {namespace}: {e}");
            Vec::new()
        }
    }
}

fn match_to_chunk(m: VectorMatch) -> Chunk {
    let text = TEXT_FIELDS
        .iter()
        .find_map(|field| m.metadata.get(*field)?.as_str().filter(|s| !s.is_empty()))
        .unwrap_or_default()
        .to_string();

    let mut chunk = Chunk::vector(m.id, text).with_score(m.score);
    for key in [meta::DOC_SUMMARY, meta::DOC_LABEL] {
        if let Some(value) = m.metadata.get(key).filter(|v| v.is_string()) {
            chunk = chunk.with_metadata(key, value.clone());
        }
    }
    chunk
}

#[cfg(test)]
mod tests {
    use super::*;
    use hybridrag_core::Origin;
    use hybridrag_storage::MockVectorIndex;
    use serde_json::json;

    fn vector_match(id: &str, fields: serde_json::Value) -> VectorMatch {
        VectorMatch {
            id: id.to_string(),
            score: 0.7,
            metadata: fields.as_object().cloned().unwrap_or_default(),
        }
    }

    #[test]
    fn test_text_field_preference() {
        let primary = match_to_chunk(vector_match("a", json!({"text": "one", "content": "two"})));
        assert_eq!(primary.text, "one");

        let secondary = match_to_chunk(vector_match("b", json!({"text": "", "content": "two"})));
        assert_eq!(secondary.text, "two");

        let neither = match_to_chunk(vector_match("c", json!({"page": 4})));
        assert_eq!(neither.text, "");
        assert_eq!(neither.origin(), Origin::Vector);
    }

    #[test]
    fn test_document_fields_carried() {
        let chunk = match_to_chunk(vector_match(
            "a",
            json!({"text": "t", "doc_summary": "About refunds", "doc_label": "Billing", "page": 3}),
        ));
        assert_eq!(chunk.metadata_str(meta::DOC_SUMMARY), Some("About refunds"));
        assert_eq!(chunk.metadata_str(meta::DOC_LABEL), Some("Billing"));
        assert!(!chunk.metadata.contains_key("page"));
        assert_eq!(chunk.score, Some(0.7));
    }

    #[tokio::test]
    async fn test_index_error_degrades_to_empty() {
        let index = MockVectorIndex::failing("qdrant unavailable");
        let chunks = vector_search(&index, &[0.1, 0.2], "u1", 10).await;
        assert!(chunks.is_empty());
        assert_eq!(index.call_count(), 1);
    }

    #[tokio::test]
    async fn test_requests_top_k_in_namespace() {
        let index = MockVectorIndex::new().with_namespace(
            "tenant-u1",
            vec![vector_match("a", json!({"text": "alpha"}))],
        );
        let chunks = vector_search(&index, &[0.1], "tenant-u1", 7).await;
        assert_eq!(chunks.len(), 1);
        assert_eq!(index.last_top_k(), 7);
    }
}
