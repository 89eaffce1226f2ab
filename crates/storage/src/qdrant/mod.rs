// Private module - only the index type is exposed
mod client;
mod search;

pub use client::QdrantVectorIndex;
