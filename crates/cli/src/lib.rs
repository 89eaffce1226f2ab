//! Library interface for the hybridrag CLI
//!
//! Output rendering lives here so it can be tested without a running
//! pipeline; main.rs only parses arguments and wires things together.

use anyhow::{Context, Result};
use hybridrag_pipeline::AnswerResponse;
use std::fmt::Write;

pub use hybridrag_core::config::Config;

/// Render a response for the terminal.
///
/// With `json` the whole response, including per-chunk debugging data, is
/// printed as pretty JSON. Otherwise the answer is followed by its sources.
pub fn render_answer(response: &AnswerResponse, json: bool) -> Result<String> {
    if json {
        return serde_json::to_string_pretty(response).context("Failed to serialize response");
    }

    let mut out = String::new();
    out.push_str(response.answer.trim_end());
    out.push('\n');

    if !response.citations.is_empty() {
        out.push_str("\nSources:\n");
        for citation in &response.citations {
            let _ = writeln!(out, "  - {citation}");
        }
    }

    let meta = &response.metadata;
    let _ = write!(
        out,
        "\n({} vector + {} graph chunks, {} merged, reranked by {}, {}ms)",
        meta.vector_count, meta.graph_count, meta.merged_count, meta.rerank_tier, meta.query_time_ms
    );
    Ok(out)
}
