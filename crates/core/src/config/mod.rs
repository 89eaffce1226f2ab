//! Configuration module for the hybridrag system
//!
//! This module provides configuration structures and loading mechanisms. Configuration
//! can be loaded from TOML files and/or environment variables.

mod defaults;
mod loading;


use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

use defaults::*;

const VALID_EMBEDDINGS_PROVIDERS: &[&str] = &["api", "mock"];
const VALID_RERANKING_PROVIDERS: &[&str] = &["jina", "vllm", "llm"];
const VALID_GENERATION_PROVIDERS: &[&str] = &["anthropic", "mock"];

/// Returns the path to the global configuration file
///
/// The global config is stored at `~/.hybridrag/config.toml`.
pub fn global_config_path() -> Result<PathBuf> {
    let home_dir = dirs::home_dir()
        .ok_or_else(|| Error::config("Unable to determine home directory".to_string()))?;
    Ok(home_dir.join(".hybridrag").join("config.toml"))
}

/// Main configuration structure for the hybridrag system
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Embeddings configuration
    #[serde(default)]
    pub embeddings: EmbeddingsConfig,

    /// Vector index and graph store configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Retrieval branch configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Reranker race and fallback configuration
    #[serde(default)]
    pub reranking: RerankingConfig,

    /// Answer generation configuration
    #[serde(default)]
    pub generation: GenerationConfig,
}

/// Configuration for query embeddings
///
/// # Providers
/// - `api` (default): OpenAI-compatible embeddings endpoint (vLLM, OpenAI, ...)
/// - `mock`: Mock provider for testing
#[derive(Clone, Serialize, Deserialize)]
pub struct EmbeddingsConfig {
    /// Provider type: "api" (default), "mock"
    #[serde(default = "default_embeddings_provider")]
    pub provider: String,

    /// Model name to use
    #[serde(default = "default_embeddings_model")]
    pub model: String,

    /// API base URL for the embeddings endpoint
    #[serde(default = "default_api_base_url")]
    pub api_base_url: Option<String>,

    /// API key for authentication (or use EMBEDDING_API_KEY env var)
    pub api_key: Option<String>,

    /// Embedding dimension size
    #[serde(default = "default_embedding_dimension")]
    pub embedding_dimension: usize,

    /// Maximum concurrent embedding API requests
    #[serde(default = "default_max_concurrent_api_requests")]
    pub max_concurrent_api_requests: usize,

    /// Number of retry attempts for failed embedding requests
    #[serde(default = "default_embedding_retry_attempts")]
    pub retry_attempts: usize,

    /// Optional instruction prepended to query texts before embedding
    #[serde(default)]
    pub query_instruction: Option<String>,
}

impl std::fmt::Debug for EmbeddingsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingsConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_base_url", &self.api_base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "***REDACTED***"))
            .field("embedding_dimension", &self.embedding_dimension)
            .field(
                "max_concurrent_api_requests",
                &self.max_concurrent_api_requests,
            )
            .field("retry_attempts", &self.retry_attempts)
            .field("query_instruction", &self.query_instruction)
            .finish()
    }
}

/// Configuration for the vector index (Qdrant) and graph store (Neo4j)
#[derive(Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Qdrant host address
    #[serde(default = "default_qdrant_host")]
    pub qdrant_host: String,

    /// Qdrant gRPC port
    #[serde(default = "default_qdrant_port")]
    pub qdrant_port: u16,

    /// Qdrant collection holding chunk vectors for every namespace
    #[serde(default = "default_collection_name")]
    pub collection_name: String,

    /// Neo4j host address
    #[serde(default = "default_neo4j_host")]
    pub neo4j_host: String,

    /// Neo4j Bolt port (driver connection)
    #[serde(default = "default_neo4j_bolt_port")]
    pub neo4j_bolt_port: u16,

    /// Neo4j username
    #[serde(default = "default_neo4j_user")]
    pub neo4j_user: String,

    /// Neo4j password
    #[serde(default = "default_neo4j_password")]
    pub neo4j_password: String,

    /// Name of the Neo4j vector index used for node similarity matching
    #[serde(default = "default_similarity_index")]
    pub similarity_index: String,

    /// Node property rendered as the node's content in graph paths
    #[serde(default = "default_node_text_property")]
    pub node_text_property: String,
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("qdrant_host", &self.qdrant_host)
            .field("qdrant_port", &self.qdrant_port)
            .field("collection_name", &self.collection_name)
            .field("neo4j_host", &self.neo4j_host)
            .field("neo4j_bolt_port", &self.neo4j_bolt_port)
            .field("neo4j_user", &self.neo4j_user)
            .field("neo4j_password", &"***REDACTED***")
            .field("similarity_index", &self.similarity_index)
            .field("node_text_property", &self.node_text_property)
            .finish()
    }
}

/// Configuration for the retrieval branches
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Nearest neighbours requested from the vector index
    #[serde(default = "default_vector_top_k")]
    pub vector_top_k: usize,

    /// Prefix joined to the user id to form the vector namespace
    #[serde(default)]
    pub namespace_prefix: String,
}

impl RetrievalConfig {
    /// Vector index namespace for a user
    pub fn namespace_for(&self, user_id: &str) -> String {
        format!("{}{user_id}", self.namespace_prefix)
    }
}

/// Configuration for a single reranker backend
#[derive(Clone, Serialize, Deserialize)]
pub struct RerankerConfig {
    /// Strategy name reported as the race winner (defaults to the provider)
    #[serde(default)]
    pub name: Option<String>,

    /// Reranker provider type: "jina", "vllm" or "llm"
    pub provider: String,

    /// Reranker model name
    pub model: String,

    /// API base URL (vllm endpoint, or an override of the Jina endpoint)
    #[serde(default)]
    pub api_base_url: Option<String>,

    /// API key (or use JINA_API_KEY / ANTHROPIC_API_KEY env vars)
    #[serde(default)]
    pub api_key: Option<String>,
}

impl RerankerConfig {
    /// Identifier used for logging and race provenance
    pub fn strategy_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.provider)
    }
}

impl std::fmt::Debug for RerankerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RerankerConfig")
            .field("name", &self.name)
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_base_url", &self.api_base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "***REDACTED***"))
            .finish()
    }
}

/// Configuration for the reranker race and its fallback chain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RerankingConfig {
    /// Shared deadline for the whole race in milliseconds
    #[serde(default = "default_race_deadline_ms")]
    pub race_deadline_ms: u64,

    /// Strategies raced against each other (empty disables the race)
    #[serde(default)]
    pub strategies: Vec<RerankerConfig>,

    /// Single reranker used when the race fails
    #[serde(default)]
    pub secondary: Option<RerankerConfig>,

    /// HTTP request timeout in seconds for reranker API calls
    #[serde(default = "default_reranking_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum concurrent requests per reranker backend
    #[serde(default = "default_reranking_max_concurrent_requests")]
    pub max_concurrent_requests: usize,
}

/// Configuration for answer generation
#[derive(Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Provider type: "anthropic" (default), "mock"
    #[serde(default = "default_generation_provider")]
    pub provider: String,

    /// Model used for the single generation call
    #[serde(default = "default_generation_model")]
    pub model: String,

    /// API key (or use ANTHROPIC_API_KEY env var)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Maximum tokens in the generated answer
    #[serde(default = "default_generation_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature
    #[serde(default)]
    pub temperature: f32,

    /// Number of reranked chunks passed to generation
    #[serde(default = "default_generation_top_k")]
    pub top_k: usize,
}

impl GenerationConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok())
    }
}

impl std::fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "***REDACTED***"))
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("top_k", &self.top_k)
            .finish()
    }
}

// Default implementations

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            provider: default_embeddings_provider(),
            model: default_embeddings_model(),
            api_base_url: default_api_base_url(),
            api_key: None,
            embedding_dimension: default_embedding_dimension(),
            max_concurrent_api_requests: default_max_concurrent_api_requests(),
            retry_attempts: default_embedding_retry_attempts(),
            query_instruction: None,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            qdrant_host: default_qdrant_host(),
            qdrant_port: default_qdrant_port(),
            collection_name: default_collection_name(),
            neo4j_host: default_neo4j_host(),
            neo4j_bolt_port: default_neo4j_bolt_port(),
            neo4j_user: default_neo4j_user(),
            neo4j_password: default_neo4j_password(),
            similarity_index: default_similarity_index(),
            node_text_property: default_node_text_property(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            vector_top_k: default_vector_top_k(),
            namespace_prefix: String::new(),
        }
    }
}

impl Default for RerankingConfig {
    fn default() -> Self {
        Self {
            race_deadline_ms: default_race_deadline_ms(),
            strategies: Vec::new(),
            secondary: None,
            timeout_secs: default_reranking_timeout_secs(),
            max_concurrent_requests: default_reranking_max_concurrent_requests(),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: default_generation_provider(),
            model: default_generation_model(),
            api_key: None,
            max_tokens: default_generation_max_tokens(),
            temperature: 0.0,
            top_k: default_generation_top_k(),
        }
    }
}

fn validate_reranker(section: &str, reranker: &RerankerConfig) -> Result<()> {
    if !VALID_RERANKING_PROVIDERS.contains(&reranker.provider.as_str()) {
        return Err(Error::config(format!(
            "Invalid reranking provider '{}' in {section}. Must be one of: {:?}",
            reranker.provider, VALID_RERANKING_PROVIDERS
        )));
    }
    if reranker.model.is_empty() {
        return Err(Error::config(format!(
            "{section}: reranker model cannot be empty"
        )));
    }
    Ok(())
}

impl Config {
    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        // Validate embeddings configuration
        if !VALID_EMBEDDINGS_PROVIDERS.contains(&self.embeddings.provider.as_str()) {
            return Err(Error::config(format!(
                "Invalid embeddings provider '{}'. Must be one of: {:?}",
                self.embeddings.provider, VALID_EMBEDDINGS_PROVIDERS
            )));
        }

        if self.embeddings.embedding_dimension == 0 {
            return Err(Error::config(
                "embedding_dimension must be greater than 0".to_string(),
            ));
        }

        if self.embeddings.max_concurrent_api_requests == 0 {
            return Err(Error::config(
                "embeddings.max_concurrent_api_requests must be greater than 0".to_string(),
            ));
        }
        if self.embeddings.max_concurrent_api_requests > 256 {
            return Err(Error::config(format!(
                "embeddings.max_concurrent_api_requests too large (max 256, got {})",
                self.embeddings.max_concurrent_api_requests
            )));
        }

        // Interpolated into Cypher, so restrict to a plain property name
        let prop = &self.storage.node_text_property;
        if prop.is_empty() || !prop.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(Error::config(format!(
                "storage.node_text_property must be a plain identifier, got '{prop}'"
            )));
        }

        // Validate retrieval configuration
        if self.retrieval.vector_top_k == 0 {
            return Err(Error::config(
                "retrieval.vector_top_k must be greater than 0".to_string(),
            ));
        }
        if self.retrieval.vector_top_k > 1000 {
            return Err(Error::config(format!(
                "retrieval.vector_top_k too large (max 1000, got {})",
                self.retrieval.vector_top_k
            )));
        }

        // Validate reranking configuration
        if self.reranking.race_deadline_ms == 0 {
            return Err(Error::config(
                "reranking.race_deadline_ms must be greater than 0".to_string(),
            ));
        }
        if self.reranking.race_deadline_ms > 60_000 {
            return Err(Error::config(format!(
                "reranking.race_deadline_ms too large (max 60000ms, got {})",
                self.reranking.race_deadline_ms
            )));
        }
        if self.reranking.max_concurrent_requests == 0 {
            return Err(Error::config(
                "reranking.max_concurrent_requests must be greater than 0".to_string(),
            ));
        }

        let mut seen_names = HashSet::new();
        for strategy in &self.reranking.strategies {
            validate_reranker("reranking.strategies", strategy)?;
            if !seen_names.insert(strategy.strategy_name()) {
                return Err(Error::config(format!(
                    "Duplicate reranking strategy name '{}'",
                    strategy.strategy_name()
                )));
            }
        }
        if let Some(ref secondary) = self.reranking.secondary {
            validate_reranker("reranking.secondary", secondary)?;
        }

        // Validate generation configuration
        if !VALID_GENERATION_PROVIDERS.contains(&self.generation.provider.as_str()) {
            return Err(Error::config(format!(
                "Invalid generation provider '{}'. Must be one of: {:?}",
                self.generation.provider, VALID_GENERATION_PROVIDERS
            )));
        }
        if self.generation.top_k == 0 {
            return Err(Error::config(
                "generation.top_k must be greater than 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.generation.temperature) {
            return Err(Error::config(format!(
                "generation.temperature must be between 0.0 and 1.0 (got {})",
                self.generation.temperature
            )));
        }
        if self.generation.max_tokens == 0 {
            return Err(Error::config(
                "generation.max_tokens must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
