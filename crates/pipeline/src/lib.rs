//! Hybrid retrieval, reranking and cited answer generation
//!
//! A query is embedded once and answered from two retrieval branches run
//! in parallel: dense-vector search in the user's namespace and a graph
//! path from the best-matching node back to its document root. The merged
//! candidates are reranked by a deadline-bounded race of rerankers with a
//! fallback chain, and the top chunks are handed to a single generation
//! call that must cite its sources.
//!
//! # Public API
//!
//! ## Main Entry Point
//! - [`RagPipeline`] - Wires the collaborators and answers requests
//!
//! ## Request/Response Models
//! - [`AnswerRequest`] - Query, user and optional top_k
//! - [`AnswerResponse`] - Answer, citations and per-chunk debugging data
//! - [`AnswerMetadata`] - Branch counts, rerank tier and timing
//!
//! ## Generation
//! - [`Generator`] - Text completion backend trait
//! - [`AnthropicGenerator`], [`MockGenerator`] - Backends
//! - [`extract_citations`], [`build_context`] - Deterministic pre/post processing
//!
//! ## Error Handling
//! - [`PipelineError`] - Error types
//! - [`Result`] - Result type alias

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

mod error;
mod generation;
mod generator;
mod graph_branch;
mod merge;
mod orchestrator;
mod prompts;
mod types;
mod vector_branch;

pub use error::{PipelineError, Result};
pub use generation::{
    build_context, extract_citations, GeneratedAnswer, CONTEXT_SEPARATOR,
    GENERATION_FAILED_ANSWER, INSUFFICIENT_CONTEXT_ANSWER,
};
pub use generator::{create_generator, AnthropicGenerator, Generator, MockGenerator};
pub use orchestrator::RagPipeline;
pub use types::{AnswerMetadata, AnswerRequest, AnswerResponse, ChunkDebug};
