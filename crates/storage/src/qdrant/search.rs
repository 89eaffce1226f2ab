use super::client::{payload_to_json, point_id_to_string, QdrantVectorIndex};
use crate::{error::StorageError, VectorIndex, VectorMatch};
use async_trait::async_trait;
use hybridrag_core::Error;
use qdrant_client::qdrant::{Condition, Filter, SearchPointsBuilder};
use tracing::debug;

/// Payload field holding the owning namespace
const NAMESPACE_FIELD: &str = "namespace";

#[async_trait]
impl VectorIndex for QdrantVectorIndex {
    async fn query_namespace(
        &self,
        namespace: &str,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<VectorMatch>, Error> {
        if vector.len() != self.dimension {
            return Err(StorageError::InvalidDimensions {
                expected: self.dimension,
                actual: vector.len(),
            }
            .into());
        }

        let filter = Filter::must([Condition::matches(NAMESPACE_FIELD, namespace.to_string())]);

        let search = SearchPointsBuilder::new(&self.collection_name, vector.to_vec(), top_k as u64)
            .filter(filter)
            .with_payload(true);

        let response = self
            .client
            .search_points(search)
            .await
            .map_err(|e| StorageError::BackendError(format!("Search failed: {e}")))?;

        debug!(
            "Qdrant returned {} points for namespace {namespace}",
            response.result.len()
        );

        Ok(response
            .result
            .into_iter()
            .filter_map(|point| {
                let id = point_id_to_string(point.id.as_ref())?;
                Some(VectorMatch {
                    id,
                    score: point.score,
                    metadata: payload_to_json(&point.payload),
                })
            })
            .collect())
    }
}
