//! Core types for the hybridrag retrieval-and-rerank engine
//!
//! This crate provides the foundational abstractions shared by every other
//! hybridrag crate:
//!
//! - **Chunks**: the canonical retrieval unit and its provenance
//! - **Race results**: the transient output of a reranker race
//! - **Configuration**: system configuration management
//! - **Error handling**: unified error types
//!

pub mod chunk;
pub mod config;
pub mod error;

// Re-export main types for convenience
pub use chunk::{Chunk, Origin, RankMeta, RerankRaceResult};
pub use config::{
    Config, EmbeddingsConfig, GenerationConfig, RerankerConfig, RerankingConfig,
    RetrievalConfig, StorageConfig,
};
pub use error::{Error, Result, ResultExt};

/// Version of the core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::chunk::{Chunk, Origin};
    pub use crate::config::Config;
    pub use crate::error::{Result, ResultExt};
}
