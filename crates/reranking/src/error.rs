//! Error types for the reranking module

use std::fmt;
use thiserror::Error;

/// Errors that can occur during reranking operations
#[derive(Debug)]
pub enum RerankingError {
    /// Inference failed
    InferenceError(String),

    /// Configuration error
    ConfigError(String),

    /// The backend answered but its response held no usable ordering
    ParseError(String),
}

impl fmt::Display for RerankingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InferenceError(msg) => write!(f, "Inference failed: {msg}"),
            Self::ConfigError(msg) => write!(f, "Configuration error: {msg}"),
            Self::ParseError(msg) => write!(f, "Unparseable ranking: {msg}"),
        }
    }
}

impl std::error::Error for RerankingError {}

impl From<RerankingError> for hybridrag_core::error::Error {
    fn from(err: RerankingError) -> Self {
        use hybridrag_core::error::Error;
        match err {
            RerankingError::ConfigError(msg) => Error::Config(msg),
            RerankingError::ParseError(msg) => Error::Parse(msg),
            other => Error::Reranking(other.to_string()),
        }
    }
}

/// Why a reranker race produced no winner
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RaceError {
    #[error("no reranking strategies configured")]
    NoStrategies,

    #[error("reranking strategy '{strategy}' failed: {reason}")]
    Failed { strategy: String, reason: String },

    #[error("reranker race deadline of {deadline_ms}ms elapsed")]
    Timeout { deadline_ms: u64 },
}

impl From<RaceError> for hybridrag_core::error::Error {
    fn from(err: RaceError) -> Self {
        use hybridrag_core::error::Error;
        match err {
            RaceError::Timeout { deadline_ms } => Error::Timeout(deadline_ms),
            other => Error::Reranking(other.to_string()),
        }
    }
}
