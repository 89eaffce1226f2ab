use crate::{error::StorageError, GraphNode, GraphStore, PathStep};
use async_trait::async_trait;
use hybridrag_core::{config::StorageConfig, Error};
use neo4rs::{Graph, Query, Row};
use std::sync::Arc;
use tracing::{debug, info};

/// Nodes carrying this label are document roots
const DOCUMENT_LABEL: &str = "Document";

/// Candidates pulled from the vector index before the user filter applies
const SIMILARITY_CANDIDATES: i64 = 25;

/// Neo4j-backed graph store
///
/// Nodes are expected to carry `id` and `user_id` properties, plus the
/// configured text property holding their content. Document roots carry
/// the `Document` label and a `title`.
pub struct Neo4jGraphStore {
    graph: Arc<Graph>,
    similarity_index: String,
    text_property: String,
}

impl Neo4jGraphStore {
    /// Connect to Neo4j server with the provided configuration
    pub async fn connect(config: &StorageConfig) -> Result<Self, Error> {
        let uri = format!("bolt://{}:{}", config.neo4j_host, config.neo4j_bolt_port);

        info!("Connecting to Neo4j at {uri}");
        info!("  Similarity index: {}", config.similarity_index);

        let graph = Graph::new(&uri, &config.neo4j_user, &config.neo4j_password)
            .await
            .map_err(|e| StorageError::ConnectionFailed(format!("Neo4j: {e}")))?;

        Ok(Self {
            graph: Arc::new(graph),
            similarity_index: config.similarity_index.clone(),
            text_property: config.node_text_property.clone(),
        })
    }

    async fn first_row(&self, query: Query) -> Result<Option<Row>, Error> {
        let mut result = self
            .graph
            .execute(query)
            .await
            .map_err(|e| StorageError::BackendError(e.to_string()))?;

        result
            .next()
            .await
            .map_err(|e| StorageError::BackendError(e.to_string()).into())
    }

    fn node_from_row(row: &Row) -> Result<GraphNode, Error> {
        Ok(GraphNode {
            id: get_column(row, "id")?,
            label: get_column(row, "label")?,
            content: get_column(row, "content")?,
        })
    }
}

fn get_column<T: serde::de::DeserializeOwned>(row: &Row, key: &str) -> Result<T, Error> {
    row.get(key)
        .map_err(|e| StorageError::RowDecode(format!("column {key}: {e}")).into())
}

#[async_trait]
impl GraphStore for Neo4jGraphStore {
    async fn match_similar_node(
        &self,
        vector: &[f32],
        user_id: &str,
    ) -> Result<Option<GraphNode>, Error> {
        let prop = &self.text_property;
        let query = Query::new(format!(
            "CALL db.index.vector.queryNodes($index, $candidates, $vector)
             YIELD node, score
             WHERE node.user_id = $user_id
             RETURN node.id AS id,
                    head(labels(node)) AS label,
                    coalesce(toString(node.{prop}), '') AS content
             ORDER BY score DESC
             LIMIT 1"
        ))
        .param("index", self.similarity_index.clone())
        .param("candidates", SIMILARITY_CANDIDATES)
        .param(
            "vector",
            vector.iter().map(|v| f64::from(*v)).collect::<Vec<f64>>(),
        )
        .param("user_id", user_id.to_string());

        let node = match self.first_row(query).await? {
            Some(row) => Some(Self::node_from_row(&row)?),
            None => None,
        };
        debug!("Similarity match for user {user_id}: {:?}", node.as_ref().map(|n| &n.id));
        Ok(node)
    }

    async fn find_root_for(
        &self,
        node: &GraphNode,
        user_id: &str,
    ) -> Result<Option<GraphNode>, Error> {
        let prop = &self.text_property;
        let query = Query::new(format!(
            "MATCH (root:{DOCUMENT_LABEL} {{user_id: $user_id}})-[*1..]->(target {{id: $target_id}})
             RETURN root.id AS id,
                    '{DOCUMENT_LABEL}' AS label,
                    coalesce(toString(root.title), toString(root.{prop}), '') AS content
             LIMIT 1"
        ))
        .param("user_id", user_id.to_string())
        .param("target_id", node.id.clone());

        match self.first_row(query).await? {
            Some(row) => Ok(Some(Self::node_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn shortest_path(
        &self,
        root: &GraphNode,
        target: &GraphNode,
    ) -> Result<Vec<PathStep>, Error> {
        let prop = &self.text_property;
        let query = Query::new(format!(
            "MATCH (root {{id: $root_id}}), (target {{id: $target_id}})
             MATCH p = shortestPath((root)-[*]->(target))
             RETURN [n IN nodes(p) | head(labels(n))] AS labels,
                    [n IN nodes(p) | coalesce(toString(n.{prop}), toString(n.title), '')] AS contents"
        ))
        .param("root_id", root.id.clone())
        .param("target_id", target.id.clone());

        let Some(row) = self.first_row(query).await? else {
            return Ok(Vec::new());
        };

        let labels: Vec<String> = get_column(&row, "labels")?;
        let contents: Vec<String> = get_column(&row, "contents")?;

        Ok(labels
            .into_iter()
            .zip(contents)
            .map(|(label, content)| PathStep { label, content })
            .collect())
    }

    async fn find_any_node(&self, user_id: &str) -> Result<Option<GraphNode>, Error> {
        let prop = &self.text_property;
        let query = Query::new(format!(
            "MATCH (n {{user_id: $user_id}})
             WHERE n.{prop} IS NOT NULL
             RETURN n.id AS id,
                    head(labels(n)) AS label,
                    toString(n.{prop}) AS content
             LIMIT 1"
        ))
        .param("user_id", user_id.to_string());

        match self.first_row(query).await? {
            Some(row) => Ok(Some(Self::node_from_row(&row)?)),
            None => Ok(None),
        }
    }
}
