//! Default values and functions for configuration

// Default constants
pub(crate) const DEFAULT_EMBEDDINGS_PROVIDER: &str = "api";
pub(crate) const DEFAULT_EMBEDDINGS_MODEL: &str = "BAAI/bge-m3";
pub(crate) const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/v1";
pub(crate) const DEFAULT_QDRANT_HOST: &str = "localhost";
pub(crate) const DEFAULT_COLLECTION_NAME: &str = "chunks";
pub(crate) const DEFAULT_NEO4J_HOST: &str = "localhost";
pub(crate) const DEFAULT_NEO4J_USER: &str = "neo4j";
pub(crate) const DEFAULT_NEO4J_PASSWORD: &str = "hybridrag";
pub(crate) const DEFAULT_SIMILARITY_INDEX: &str = "node_embeddings";
pub(crate) const DEFAULT_NODE_TEXT_PROPERTY: &str = "content";
pub(crate) const DEFAULT_GENERATION_PROVIDER: &str = "anthropic";
pub(crate) const DEFAULT_GENERATION_MODEL: &str = "claude-sonnet-4-5";

pub(crate) fn default_embeddings_provider() -> String {
    DEFAULT_EMBEDDINGS_PROVIDER.to_string()
}

pub(crate) fn default_embeddings_model() -> String {
    DEFAULT_EMBEDDINGS_MODEL.to_string()
}

pub(crate) fn default_api_base_url() -> Option<String> {
    Some(DEFAULT_API_BASE_URL.to_string())
}

pub(crate) fn default_embedding_dimension() -> usize {
    1024
}

pub(crate) fn default_max_concurrent_api_requests() -> usize {
    4
}

pub(crate) fn default_embedding_retry_attempts() -> usize {
    2
}

pub(crate) fn default_qdrant_host() -> String {
    DEFAULT_QDRANT_HOST.to_string()
}

pub(crate) fn default_qdrant_port() -> u16 {
    6334
}

pub(crate) fn default_collection_name() -> String {
    DEFAULT_COLLECTION_NAME.to_string()
}

pub(crate) fn default_neo4j_host() -> String {
    DEFAULT_NEO4J_HOST.to_string()
}

pub(crate) fn default_neo4j_bolt_port() -> u16 {
    7687
}

pub(crate) fn default_neo4j_user() -> String {
    DEFAULT_NEO4J_USER.to_string()
}

pub(crate) fn default_neo4j_password() -> String {
    DEFAULT_NEO4J_PASSWORD.to_string()
}

pub(crate) fn default_similarity_index() -> String {
    DEFAULT_SIMILARITY_INDEX.to_string()
}

pub(crate) fn default_node_text_property() -> String {
    DEFAULT_NODE_TEXT_PROPERTY.to_string()
}

pub(crate) fn default_vector_top_k() -> usize {
    10
}

pub(crate) fn default_race_deadline_ms() -> u64 {
    2_000
}

pub(crate) fn default_reranking_timeout_secs() -> u64 {
    15
}

pub(crate) fn default_reranking_max_concurrent_requests() -> usize {
    16
}

pub(crate) fn default_generation_provider() -> String {
    DEFAULT_GENERATION_PROVIDER.to_string()
}

pub(crate) fn default_generation_model() -> String {
    DEFAULT_GENERATION_MODEL.to_string()
}

pub(crate) fn default_generation_max_tokens() -> u32 {
    1024
}

pub(crate) fn default_generation_top_k() -> usize {
    5
}
