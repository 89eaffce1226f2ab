//! Graph retrieval: match a node, walk back to its document, linearize the path

use hybridrag_core::chunk::meta;
use hybridrag_core::Chunk;
use hybridrag_storage::{GraphNode, GraphStore, PathStep};
use tracing::{debug, info, warn};

const PATH_SEPARATOR: &str = " > ";

/// Marker in a similarity-lookup error that means the index itself is unusable
const INDEX_ERROR_MARKER: &str = "index";

/// Retrieve at most one path chunk for the user.
///
/// When the similarity index is unavailable, falls back to an unranked
/// single-node lookup. Every other failure degrades to an empty result.
pub(crate) async fn graph_search(
    store: &dyn GraphStore,
    embedding: &[f32],
    user_id: &str,
) -> Vec<Chunk> {
    let target = match store.match_similar_node(embedding, user_id).await {
        Ok(Some(target)) => target,
        Ok(None) => {
            debug!("Graph branch: no similar node for user {user_id}");
            return Vec::new();
        }
        Err(e) if e.to_string().to_lowercase().contains(INDEX_ERROR_MARKER) => {
            warn!("Graph similarity index unavailable, using unranked lookup: {e}");
            return unranked_lookup(store, user_id).await;
        }
        Err(e) => {
            warn!("Graph branch failed to match a node: {e}");
            return Vec::new();
        }
    };

    match path_chunk(store, &target, user_id).await {
        Ok(chunk) => chunk.into_iter().collect(),
        Err(e) => {
            warn!("Graph branch failed to build a path for {}: {e}", target.id);
            Vec::new()
        }
    }
}

async fn path_chunk(
    store: &dyn GraphStore,
    target: &GraphNode,
    user_id: &str,
) -> hybridrag_core::Result<Option<Chunk>> {
    let Some(root) = store.find_root_for(target, user_id).await? else {
        debug!("Graph branch: no document root reaches {}", target.id);
        return Ok(None);
    };

    let path = store.shortest_path(&root, target).await?;
    if path.is_empty() {
        debug!("Graph branch: no path from {} to {}", root.id, target.id);
        return Ok(None);
    }

    let hops = path.len() - 1;
    let chunk = Chunk::graph(
        format!("graph:{}:{}", root.id, target.id),
        linearize(&root, &path),
    )
    .with_metadata(meta::ROOT_ID, root.id.clone())
    .with_metadata(meta::ROOT_TITLE, root.content.clone())
    .with_metadata(meta::TARGET_ID, target.id.clone())
    .with_metadata(meta::PATH_LENGTH, hops);

    info!(
        "Graph branch: {hops}-hop path from {} to {}",
        root.id, target.id
    );
    Ok(Some(chunk))
}

/// Render `Document: <title>` followed by every node on the path as
/// `<Label>: <content>`, all joined by ` > `.
fn linearize(root: &GraphNode, path: &[PathStep]) -> String {
    std::iter::once(format!("Document: {}", root.content))
        .chain(path.iter().map(|step| format!("{}: {}", step.label, step.content)))
        .collect::<Vec<_>>()
        .join(PATH_SEPARATOR)
}

async fn unranked_lookup(store: &dyn GraphStore, user_id: &str) -> Vec<Chunk> {
    match store.find_any_node(user_id).await {
        Ok(Some(node)) => vec![Chunk::graph(
            format!("graph:{}", node.id),
            format!("{}: {}", node.label, node.content),
        )],
        Ok(None) => Vec::new(),
        Err(e) => {
            warn!("Graph fallback lookup failed: {e}");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hybridrag_core::Origin;
    use hybridrag_storage::MockGraphStore;
    use pretty_assertions::assert_eq;

    fn handbook_store() -> MockGraphStore {
        let target = GraphNode::new("n3", "Paragraph", "Refunds take 5 days");
        let root = GraphNode::new("d1", "Document", "Billing Handbook");
        MockGraphStore::new("u1")
            .with_target(target.clone())
            .with_root(
                root,
                vec![
                    PathStep::new("Document", "Policies for billing and refunds"),
                    PathStep::new("Section", "Refunds"),
                    PathStep::from(&target),
                ],
            )
    }

    #[tokio::test]
    async fn test_path_is_linearized_with_document_prefix() {
        let chunks = graph_search(&handbook_store(), &[0.1], "u1").await;

        assert_eq!(chunks.len(), 1);
        let chunk = &chunks[0];
        assert_eq!(chunk.id(), "graph:d1:n3");
        assert_eq!(chunk.origin(), Origin::Graph);
        assert_eq!(
            chunk.text,
            "Document: Billing Handbook > Document: Policies for billing and refunds > Section: Refunds > Paragraph: Refunds take 5 days"
        );
        assert_eq!(chunk.metadata_str(meta::ROOT_ID), Some("d1"));
        assert_eq!(chunk.metadata_str(meta::TARGET_ID), Some("n3"));
        assert_eq!(chunk.metadata[meta::PATH_LENGTH], 2);
        assert_eq!(chunk.score, None);
    }

    #[tokio::test]
    async fn test_other_user_gets_nothing() {
        assert!(graph_search(&handbook_store(), &[0.1], "u2").await.is_empty());
    }

    #[tokio::test]
    async fn test_missing_root_gives_empty() {
        let store = MockGraphStore::new("u1").with_target(GraphNode::new("n1", "Note", "orphan"));
        assert!(graph_search(&store, &[0.1], "u1").await.is_empty());
    }

    #[tokio::test]
    async fn test_index_error_falls_back_to_unranked_node() {
        let store = MockGraphStore::new("u1")
            .with_similarity_error("There is no such vector schema index: node_embeddings")
            .with_any_node(GraphNode::new("n7", "Section", "Shipping"));

        let chunks = graph_search(&store, &[0.1], "u1").await;

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].id(), "graph:n7");
        assert_eq!(chunks[0].text, "Section: Shipping");
        assert!(!chunks[0].metadata.contains_key(meta::PATH_LENGTH));
        assert!(!chunks[0].metadata.contains_key(meta::ROOT_ID));
        assert_eq!(store.fallback_calls(), 1);
    }

    #[tokio::test]
    async fn test_other_errors_do_not_fall_back() {
        let store = MockGraphStore::new("u1")
            .with_similarity_error("connection reset by peer")
            .with_any_node(GraphNode::new("n7", "Section", "Shipping"));

        assert!(graph_search(&store, &[0.1], "u1").await.is_empty());
        assert_eq!(store.fallback_calls(), 0);
    }

    #[tokio::test]
    async fn test_path_error_degrades_to_empty() {
        let store = handbook_store().with_path_error("transaction terminated");
        assert!(graph_search(&store, &[0.1], "u1").await.is_empty());
    }
}
