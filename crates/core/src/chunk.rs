//! The canonical retrieval unit and its provenance

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Well-known metadata keys carried by chunks
pub mod meta {
    /// Summary of the document a vector chunk was cut from
    pub const DOC_SUMMARY: &str = "doc_summary";
    /// Human-readable label of the document a vector chunk was cut from
    pub const DOC_LABEL: &str = "doc_label";
    /// Id of the document root node a graph path starts at
    pub const ROOT_ID: &str = "root_id";
    /// Title of the document root node
    pub const ROOT_TITLE: &str = "root_title";
    /// Id of the similarity-matched node a graph path ends at
    pub const TARGET_ID: &str = "target_id";
    /// Hop count of the graph path
    pub const PATH_LENGTH: &str = "path_length";
}

/// Retrieval branch that produced a chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// Dense-vector similarity search
    Vector,
    /// Graph traversal from a matched node to its document root
    Graph,
}

impl Origin {
    /// Label used when rendering context for generation
    pub fn context_label(self) -> &'static str {
        match self {
            Self::Vector => "Vector-Chunk",
            Self::Graph => "Graph-Node",
        }
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vector => write!(f, "vector"),
            Self::Graph => write!(f, "graph"),
        }
    }
}

/// Provenance of a reranker race win, attached to the top-ranked chunk only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankMeta {
    pub winner_strategy: String,
    pub latency_ms: u64,
}

/// A retrievable unit of text plus provenance metadata.
///
/// `id` and `origin` are fixed at construction. `rank_meta` stays empty until
/// a reranker race completes and is then set on the single top result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    id: String,
    pub text: String,
    /// Relevance score from the originating branch; not comparable across origins
    pub score: Option<f32>,
    origin: Origin,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rank_meta: Option<RankMeta>,
}

impl Chunk {
    pub fn new(id: impl Into<String>, text: impl Into<String>, origin: Origin) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            score: None,
            origin,
            metadata: Map::new(),
            rank_meta: None,
        }
    }

    /// Create a vector-origin chunk
    pub fn vector(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(id, text, Origin::Vector)
    }

    /// Create a graph-origin chunk
    pub fn graph(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(id, text, Origin::Graph)
    }

    pub fn with_score(mut self, score: f32) -> Self {
        self.score = Some(score);
        self
    }

    pub fn with_metadata(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn rank_meta(&self) -> Option<&RankMeta> {
        self.rank_meta.as_ref()
    }

    /// Record the race winner on this chunk.
    ///
    /// Only the reranker race calls this, and only for the chunk it places first.
    pub fn annotate_rank(&mut self, rank_meta: RankMeta) {
        self.rank_meta = Some(rank_meta);
    }

    /// String metadata value, ignoring empty strings
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Score with a missing value treated as zero
    pub fn score_or_zero(&self) -> f32 {
        self.score.unwrap_or(0.0)
    }
}

/// Transient output of a reranker race
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RerankRaceResult {
    /// Permutation of input positions, best first
    pub ordered_indices: Vec<usize>,
    pub winner_strategy: String,
    /// Time from race start until the winner resolved
    pub latency_ms: u64,
}
