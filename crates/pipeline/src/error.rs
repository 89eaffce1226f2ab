//! Error types for the answering pipeline

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("API key not configured for generation provider '{0}'")]
    MissingApiKey(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Failed to connect to {service}: {message}")]
    Connection { service: String, message: String },
}

impl PipelineError {
    /// Wrap a collaborator construction error, keeping configuration
    /// problems distinct from unreachable services.
    pub(crate) fn startup(service: &str, err: hybridrag_core::Error) -> Self {
        if err.is_config() {
            Self::Config(err.to_string())
        } else {
            Self::Connection {
                service: service.to_string(),
                message: err.to_string(),
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
