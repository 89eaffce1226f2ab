//! Context assembly, the single generation call, and citation extraction

use crate::generator::Generator;
use crate::prompts::{format_prompt, ANSWER_SYSTEM, ANSWER_USER};
use hybridrag_core::chunk::meta;
use hybridrag_core::{Chunk, Origin};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

/// Returned without calling the backend when no chunks survive retrieval
pub const INSUFFICIENT_CONTEXT_ANSWER: &str =
    "I could not find enough information in your documents to answer this question.";

/// Returned when the backend errors or produces no text
pub const GENERATION_FAILED_ANSWER: &str =
    "I was unable to generate an answer from the retrieved context. Please try again.";

/// Delimits the context-priming prefix an indexer may prepend to chunk text
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

static CITATION_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\[Source:\s*([^\]]+)\]").ok());

/// Answer text plus the sources it cites
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedAnswer {
    pub answer: String,
    pub citations: Vec<String>,
}

impl GeneratedAnswer {
    fn canned(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            citations: Vec::new(),
        }
    }
}

/// Generate an answer from the first `top_k` chunks.
///
/// Issues at most one backend call. Never fails: backend errors and empty
/// completions become a canned answer with no citations.
pub(crate) async fn generate(
    generator: &dyn Generator,
    query: &str,
    chunks: &[Chunk],
    top_k: usize,
) -> GeneratedAnswer {
    let selected = &chunks[..chunks.len().min(top_k)];
    if selected.is_empty() {
        info!("No context chunks; skipping generation");
        return GeneratedAnswer::canned(INSUFFICIENT_CONTEXT_ANSWER);
    }

    let context = build_context(selected);
    let user_prompt = format_prompt(ANSWER_USER, &[("context", &context), ("question", query)]);
    debug!(
        "Generating from {} chunks ({} context chars)",
        selected.len(),
        context.len()
    );

    match generator.complete(ANSWER_SYSTEM, &user_prompt).await {
        Ok(text) if !text.trim().is_empty() => {
            let citations = extract_citations(&text);
            debug!("Answer cites {} sources", citations.len());
            GeneratedAnswer {
                answer: text,
                citations,
            }
        }
        Ok(_) => {
            warn!("Generation returned empty text");
            GeneratedAnswer::canned(GENERATION_FAILED_ANSWER)
        }
        Err(e) => {
            warn!("Generation failed: {e}");
            GeneratedAnswer::canned(GENERATION_FAILED_ANSWER)
        }
    }
}

/// Render chunks as source-headed context blocks
pub fn build_context(chunks: &[Chunk]) -> String {
    chunks
        .iter()
        .map(render_chunk)
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn render_chunk(chunk: &Chunk) -> String {
    let mut block = format!(
        "[Source: {}] (Origin: {})\n",
        chunk.id(),
        chunk.origin().context_label()
    );

    match chunk.origin() {
        Origin::Graph => block.push_str(&chunk.text),
        Origin::Vector => {
            if let Some(label) = chunk.metadata_str(meta::DOC_LABEL) {
                block.push_str(&format!("Document: {label}\n"));
            }
            if let Some(summary) = chunk.metadata_str(meta::DOC_SUMMARY) {
                block.push_str(&format!("Summary: {summary}\n"));
            }
            block.push_str(strip_context_prefix(&chunk.text));
        }
    }
    block
}

/// Drop everything up to and including the first context separator
fn strip_context_prefix(text: &str) -> &str {
    match text.split_once(CONTEXT_SEPARATOR) {
        Some((_, original)) => original,
        None => text,
    }
}

/// Collect cited source ids in order of first appearance
pub fn extract_citations(answer: &str) -> Vec<String> {
    let Some(pattern) = CITATION_PATTERN.as_ref() else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    pattern
        .captures_iter(answer)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|id| !id.is_empty() && seen.insert(id.to_string()))
        .map(str::to_string)
        .collect()
}
