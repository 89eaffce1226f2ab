//! Neo4j graph store for path-based retrieval

pub(crate) mod client;
pub(crate) mod mock;

pub use client::Neo4jGraphStore;
pub use mock::MockGraphStore;
