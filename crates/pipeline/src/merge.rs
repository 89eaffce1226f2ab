//! Merging branch results into one candidate list

use hybridrag_core::Chunk;
use std::collections::HashSet;
use tracing::debug;

/// Identity used to detect duplicate chunks
#[derive(Debug, PartialEq, Eq, Hash)]
enum DedupKey {
    Id(String),
    TextHash(i32),
}

impl DedupKey {
    fn of(chunk: &Chunk) -> Self {
        if chunk.id().is_empty() {
            Self::TextHash(text_hash(&chunk.text))
        } else {
            Self::Id(chunk.id().to_string())
        }
    }
}

/// 31-multiplier rolling hash over the text's characters, wrapping at 32 bits
pub(crate) fn text_hash(text: &str) -> i32 {
    text.chars()
        .fold(0i32, |hash, c| hash.wrapping_mul(31).wrapping_add(c as i32))
}

/// Concatenate vector results before graph results and drop duplicates.
pub(crate) fn merge_results(vector: Vec<Chunk>, graph: Vec<Chunk>) -> Vec<Chunk> {
    let mut merged = vector;
    merged.extend(graph);
    dedup(merged)
}

/// Keep the first chunk for each id (or text hash when the id is empty),
/// preserving first-seen order.
pub(crate) fn dedup(chunks: Vec<Chunk>) -> Vec<Chunk> {
    let before = chunks.len();
    let mut seen = HashSet::with_capacity(before);
    let kept: Vec<Chunk> = chunks
        .into_iter()
        .filter(|chunk| seen.insert(DedupKey::of(chunk)))
        .collect();

    if kept.len() < before {
        debug!("Dedup dropped {} of {before} chunks", before - kept.len());
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use hybridrag_core::Origin;
    use pretty_assertions::assert_eq;

    fn ids(chunks: &[Chunk]) -> Vec<&str> {
        chunks.iter().map(|c| c.id()).collect()
    }

    #[test]
    fn test_first_occurrence_wins() {
        let chunks = vec![
            Chunk::vector("a", "first a"),
            Chunk::vector("b", "b"),
            Chunk::graph("a", "second a"),
        ];
        let kept = dedup(chunks);
        assert_eq!(ids(&kept), vec!["a", "b"]);
        assert_eq!(kept[0].text, "first a");
        assert_eq!(kept[0].origin(), Origin::Vector);
    }

    #[test]
    fn test_empty_ids_dedup_by_text() {
        let chunks = vec![
            Chunk::vector("", "same text"),
            Chunk::vector("", "other text"),
            Chunk::graph("", "same text"),
        ];
        let kept = dedup(chunks);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[1].text, "other text");
    }

    #[test]
    fn test_id_and_hash_keys_never_collide() {
        let hash_as_id = text_hash("x").to_string();
        let chunks = vec![Chunk::vector("", "x"), Chunk::vector(hash_as_id, "y")];
        assert_eq!(dedup(chunks).len(), 2);
    }

    #[test]
    fn test_text_hash_matches_reference_values() {
        assert_eq!(text_hash(""), 0);
        assert_eq!(text_hash("a"), 97);
        assert_eq!(text_hash("hello"), 99_162_322);
        // Wraps instead of overflowing
        let long = "z".repeat(64);
        let _ = text_hash(&long);
    }

    #[test]
    fn test_ten_vector_plus_one_graph() {
        let vector: Vec<Chunk> = (0..10)
            .map(|i| Chunk::vector(format!("v{i}"), format!("vector {i}")))
            .collect();
        let graph = vec![Chunk::graph("graph:d1:n1", "Document: D > Section: S")];

        let merged = merge_results(vector, graph);

        assert_eq!(merged.len(), 11);
        assert!(merged[..10].iter().all(|c| c.origin() == Origin::Vector));
        assert_eq!(merged[10].origin(), Origin::Graph);
    }
}
