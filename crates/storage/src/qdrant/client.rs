//! Qdrant connection and payload conversion

use crate::error::StorageError;
use hybridrag_core::{config::StorageConfig, error::Result};
use qdrant_client::{
    config::QdrantConfig,
    qdrant::{point_id::PointIdOptions, PointId, Value as QdrantValue},
    Qdrant,
};
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;
use tracing::info;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Vector index backed by a single Qdrant collection
///
/// Namespaces are a keyword payload field on each point, so every user
/// shares one collection.
pub struct QdrantVectorIndex {
    pub(super) client: Qdrant,
    pub(super) collection_name: String,
    pub(super) dimension: usize,
}

impl QdrantVectorIndex {
    /// Connect to Qdrant and verify the server is reachable
    pub async fn connect(config: &StorageConfig, dimension: usize) -> Result<Self> {
        let url = format!("http://{}:{}", config.qdrant_host, config.qdrant_port);

        info!("Connecting to Qdrant at {url}");
        info!("  Collection: {}", config.collection_name);

        let mut client_config = QdrantConfig::from_url(&url);
        client_config.timeout = REQUEST_TIMEOUT;

        let client = Qdrant::new(client_config)
            .map_err(|e| StorageError::ConnectionFailed(e.to_string()))?;

        client
            .health_check()
            .await
            .map_err(|e| StorageError::ConnectionFailed(format!("Health check failed: {e}")))?;

        Ok(Self {
            client,
            collection_name: config.collection_name.clone(),
            dimension,
        })
    }
}

/// Render a point id the way it was stored
pub(super) fn point_id_to_string(id: Option<&PointId>) -> Option<String> {
    match id?.point_id_options.as_ref()? {
        PointIdOptions::Num(n) => Some(n.to_string()),
        PointIdOptions::Uuid(uuid) => Some(uuid.clone()),
    }
}

/// Convert a Qdrant payload into a JSON object
pub(super) fn payload_to_json(
    payload: &HashMap<String, QdrantValue>,
) -> serde_json::Map<String, serde_json::Value> {
    payload
        .iter()
        .map(|(key, value)| (key.clone(), qdrant_value_to_json(value)))
        .collect()
}

fn qdrant_value_to_json(value: &QdrantValue) -> serde_json::Value {
    use qdrant_client::qdrant::value::Kind;

    match &value.kind {
        Some(Kind::NullValue(_)) | None => serde_json::Value::Null,
        Some(Kind::BoolValue(b)) => serde_json::Value::Bool(*b),
        Some(Kind::IntegerValue(i)) => json!(*i),
        Some(Kind::DoubleValue(d)) => json!(*d),
        Some(Kind::StringValue(s)) => serde_json::Value::String(s.clone()),
        Some(Kind::ListValue(list)) => {
            serde_json::Value::Array(list.values.iter().map(qdrant_value_to_json).collect())
        }
        Some(Kind::StructValue(s)) => serde_json::Value::Object(
            s.fields
                .iter()
                .map(|(k, v)| (k.clone(), qdrant_value_to_json(v)))
                .collect(),
        ),
    }
}
