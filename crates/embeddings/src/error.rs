//! Error types for the embeddings module

use std::fmt;

/// Errors that can occur during embedding operations
#[derive(Debug)]
pub enum EmbeddingError {
    /// Inference failed
    InferenceError(String),

    /// Unsupported provider
    UnsupportedProvider(String),

    /// Configuration error
    ConfigError(String),
}

impl fmt::Display for EmbeddingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InferenceError(msg) => write!(f, "Inference failed: {msg}"),
            Self::UnsupportedProvider(provider) => {
                write!(f, "Unsupported embedding provider: {provider}")
            }
            Self::ConfigError(msg) => write!(f, "Configuration error: {msg}"),
        }
    }
}

impl std::error::Error for EmbeddingError {}

impl From<EmbeddingError> for hybridrag_core::error::Error {
    fn from(err: EmbeddingError) -> Self {
        match err {
            EmbeddingError::ConfigError(msg) | EmbeddingError::UnsupportedProvider(msg) => {
                hybridrag_core::error::Error::Config(msg)
            }
            other => hybridrag_core::error::Error::Embedding(other.to_string()),
        }
    }
}
