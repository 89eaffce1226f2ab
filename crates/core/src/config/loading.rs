//! Configuration loading from files and environment variables

use crate::error::{Error, Result};
use config::{Config as ConfigLib, ConfigBuilder as LibConfigBuilder, Environment, File};
use std::path::Path;

use super::{global_config_path, Config};

type Builder = LibConfigBuilder<config::builder::DefaultState>;

/// Helper to override a string key from a conventional environment variable
fn override_from_env(builder: Builder, env_var: &str, key: &str) -> Result<Builder> {
    match std::env::var(env_var) {
        Ok(value) => builder
            .set_override(key, value)
            .map_err(|e| Error::config(format!("Failed to set {env_var}: {e}"))),
        Err(_) => Ok(builder),
    }
}

/// Helper to override a port key, ignoring values that do not parse
fn override_port_from_env(builder: Builder, env_var: &str, key: &str) -> Result<Builder> {
    match std::env::var(env_var).ok().and_then(|p| p.parse::<u16>().ok()) {
        Some(port) => builder
            .set_override(key, port)
            .map_err(|e| Error::config(format!("Failed to set {env_var}: {e}"))),
        None => Ok(builder),
    }
}

impl Config {
    /// Loads configuration from a TOML file with environment variable overrides
    ///
    /// Environment variables are prefixed with `HYBRIDRAG_` and use double underscores
    /// for nested values. For example:
    /// - `HYBRIDRAG_RERANKING__RACE_DEADLINE_MS=1500`
    pub fn from_file(path: &Path) -> Result<Self> {
        let mut builder = ConfigLib::builder();

        // Add the config file if it exists
        if path.exists() {
            builder = builder.add_source(File::from(path));
        }

        // Add environment variables with HYBRIDRAG_ prefix
        builder = builder.add_source(
            Environment::with_prefix("HYBRIDRAG")
                .separator("__")
                .try_parsing(true),
        );

        // Conventional environment variables for storage backends
        builder = override_from_env(builder, "QDRANT_HOST", "storage.qdrant_host")?;
        builder = override_port_from_env(builder, "QDRANT_PORT", "storage.qdrant_port")?;
        builder = override_from_env(builder, "NEO4J_HOST", "storage.neo4j_host")?;
        builder = override_port_from_env(builder, "NEO4J_BOLT_PORT", "storage.neo4j_bolt_port")?;
        builder = override_from_env(builder, "NEO4J_USER", "storage.neo4j_user")?;
        builder = override_from_env(builder, "NEO4J_PASSWORD", "storage.neo4j_password")?;

        let config = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| Error::config(format!("Failed to deserialize config: {e}")))
    }

    /// Creates a config from a TOML string (useful for testing)
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from a single file
    ///
    /// Precedence (lowest to highest):
    /// 1. Hardcoded defaults
    /// 2. Config file (~/.hybridrag/config.toml or custom --config path)
    /// 3. Environment variables (HYBRIDRAG_*, then QDRANT_*/NEO4J_*)
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let path = match config_path {
            Some(p) => p.to_path_buf(),
            None => global_config_path()?,
        };
        let config = Self::from_file(&path)?;
        config.validate()?;
        Ok(config)
    }
}
