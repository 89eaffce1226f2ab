//! Reranking for hybrid retrieval results
//!
//! Every backend is adapted to one capability, [`Reranker`]: given a query
//! and an ordered list of texts, return the positions of those texts from
//! most to least relevant. On top of that capability sit the reranker race
//! ([`RerankRace`]), which runs several strategies against a shared deadline
//! and keeps the first valid ordering, and the fallback chain
//! ([`FallbackReranker`]), which degrades to a secondary reranker and then
//! to score sorting.

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

use async_trait::async_trait;
use hybridrag_core::config::{RerankerConfig, RerankingConfig};
use hybridrag_core::error::{Error, Result};
use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub mod error;
mod fallback;
mod jina;
mod listwise;
mod mock;
mod race;
mod vllm;

pub use error::{RaceError, RerankingError};
pub use fallback::{FallbackReranker, RerankOutcome, RerankTier};
pub use jina::JinaReranker;
pub use listwise::{parse_bracketed_ranking, ListwiseReranker};
pub use mock::{MockReranker, MockRerankerBehavior};
pub use race::{apply_race_result, pad_permutation, RerankRace};
pub use vllm::VllmReranker;

const DEFAULT_VLLM_BASE_URL: &str = "http://localhost:8001/v1";

/// Longest document text sent to a cross-encoder (~1200 tokens)
pub(crate) const MAX_DOCUMENT_CHARS: usize = 4_800;

/// Order two relevance scores descending, with NaN sorted to the end.
pub(crate) fn compare_scores_descending(a: f32, b: f32) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

/// Sort scored documents by relevance score descending, with NaN values sorted to the end.
pub(crate) fn sort_scores_descending(scored_docs: &mut [(usize, f32)]) {
    scored_docs.sort_by(|a, b| compare_scores_descending(a.1, b.1));
}

/// Truncate text to at most `max_chars` characters, marking the cut with an ellipsis
pub(crate) fn truncate_for_reranking(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{kept}...")
}

/// A reranking backend
///
/// Implementations own their vendor's request and response shapes and
/// adapt them to a list of 0-based positions into `documents`, best first.
/// The list may cover only a subset of the input.
#[async_trait]
pub trait Reranker: Send + Sync {
    /// Strategy identifier recorded on race winners
    fn name(&self) -> &str;

    /// Rank `documents` by relevance to `query`.
    async fn rerank(&self, query: &str, documents: &[&str]) -> Result<Vec<usize>>;
}

/// Create a reranker from one strategy entry of the configuration
///
/// API keys come from the entry itself or, when absent, from the
/// provider's conventional environment variable. A missing key is a
/// configuration error raised before any network call.
pub async fn create_reranker(
    config: &RerankerConfig,
    settings: &RerankingConfig,
) -> Result<Arc<dyn Reranker>> {
    let name = config.strategy_name().to_string();
    match config.provider.as_str() {
        "jina" => {
            let api_key = config
                .api_key
                .clone()
                .or_else(|| std::env::var("JINA_API_KEY").ok())
                .ok_or_else(|| {
                    Error::config(format!(
                        "Jina API key required for reranker '{name}'. Set api_key or JINA_API_KEY env var"
                    ))
                })?;

            info!("Creating Jina reranker '{name}'");
            let reranker = JinaReranker::new(
                name,
                api_key,
                config.model.clone(),
                config.api_base_url.clone(),
                settings.timeout_secs,
                settings.max_concurrent_requests,
            )?;
            Ok(Arc::new(reranker))
        }
        "vllm" => {
            let api_base_url = config
                .api_base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_VLLM_BASE_URL.to_string());

            info!("Creating vLLM reranker '{name}'");
            let reranker = VllmReranker::new(
                name,
                config.model.clone(),
                api_base_url,
                settings.timeout_secs,
                settings.max_concurrent_requests,
            )?;

            // Perform health check (non-blocking)
            reranker.check_health().await;

            Ok(Arc::new(reranker))
        }
        "llm" => {
            let api_key = config
                .api_key
                .clone()
                .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok())
                .ok_or_else(|| {
                    Error::config(format!(
                        "Anthropic API key required for reranker '{name}'. Set api_key or ANTHROPIC_API_KEY env var"
                    ))
                })?;

            info!("Creating LLM listwise reranker '{name}'");
            let reranker = ListwiseReranker::new(name, api_key, config.model.clone())?;
            Ok(Arc::new(reranker))
        }
        other => Err(Error::config(format!(
            "Unknown reranking provider: '{other}'. Valid providers: jina, vllm, llm"
        ))),
    }
}

/// Build the full fallback chain described by the reranking section
///
/// Every racing strategy and the optional secondary reranker are created
/// up front, so a missing credential fails here rather than mid-query.
pub async fn create_fallback_reranker(config: &RerankingConfig) -> Result<FallbackReranker> {
    let mut strategies = Vec::with_capacity(config.strategies.len());
    for strategy in &config.strategies {
        strategies.push(create_reranker(strategy, config).await?);
    }

    let secondary = match config.secondary {
        Some(ref secondary) => Some(create_reranker(secondary, config).await?),
        None => None,
    };

    info!(
        "Reranking: {} racing strategies, deadline {}ms, secondary: {}",
        strategies.len(),
        config.race_deadline_ms,
        secondary.as_ref().map(|s| s.name()).unwrap_or("none")
    );

    let race = RerankRace::new(strategies, Duration::from_millis(config.race_deadline_ms));
    Ok(FallbackReranker::new(
        race,
        secondary,
        Duration::from_secs(config.timeout_secs),
    ))
}
