//! Tiered reranking that always produces an ordering
//!
//! Tier 1 is the reranker race, tier 2 a single secondary reranker and
//! tier 3 a sort on each chunk's own retrieval score. A tier runs only
//! when the one before it is unavailable or fails, and no failure reaches
//! the caller.

use crate::error::RaceError;
use crate::race::{apply_race_result, RerankRace};
use crate::{compare_scores_descending, Reranker};
use hybridrag_core::Chunk;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Which tier produced the final ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RerankTier {
    /// A racing strategy won
    Race,
    /// The secondary reranker ranked the chunks
    Secondary,
    /// Chunks were sorted by retrieval score
    ScoreSort,
    /// Nothing to rank (zero or one chunk)
    None,
}

impl fmt::Display for RerankTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Race => "race",
            Self::Secondary => "secondary",
            Self::ScoreSort => "score_sort",
            Self::None => "none",
        };
        f.write_str(name)
    }
}

/// Reranked chunks and the tier that ordered them
#[derive(Debug, Clone)]
pub struct RerankOutcome {
    pub chunks: Vec<Chunk>,
    pub tier: RerankTier,
}

/// Why a tier was skipped, for logging
enum TierFailure {
    NotConfigured,
    Failed(String),
    TimedOut(u64),
}

impl fmt::Display for TierFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConfigured => f.write_str("not configured"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
            Self::TimedOut(ms) => write!(f, "timed out after {ms}ms"),
        }
    }
}

impl From<RaceError> for TierFailure {
    fn from(err: RaceError) -> Self {
        match err {
            RaceError::NoStrategies => Self::NotConfigured,
            RaceError::Timeout { deadline_ms } => Self::TimedOut(deadline_ms),
            other => Self::Failed(other.to_string()),
        }
    }
}

/// The reranking phase of a query: race, then secondary, then score sort
pub struct FallbackReranker {
    race: RerankRace,
    secondary: Option<Arc<dyn Reranker>>,
    secondary_timeout: Duration,
}

impl FallbackReranker {
    pub fn new(
        race: RerankRace,
        secondary: Option<Arc<dyn Reranker>>,
        secondary_timeout: Duration,
    ) -> Self {
        Self {
            race,
            secondary,
            secondary_timeout,
        }
    }

    pub fn race(&self) -> &RerankRace {
        &self.race
    }

    pub fn has_secondary(&self) -> bool {
        self.secondary.is_some()
    }

    /// Order `chunks` by relevance to `query` and keep at most `top_k`.
    ///
    /// Zero or one chunk is returned in input order without calling any
    /// reranker. Only a race winner's top chunk carries rank metadata.
    pub async fn rerank_with_fallback(
        &self,
        query: &str,
        mut chunks: Vec<Chunk>,
        top_k: usize,
    ) -> RerankOutcome {
        if chunks.len() <= 1 {
            chunks.truncate(top_k);
            return RerankOutcome {
                chunks,
                tier: RerankTier::None,
            };
        }

        let count = chunks.len();
        let started = Instant::now();

        match self.race.race(query, &chunks).await {
            Ok(result) => {
                let mut ordered = apply_race_result(chunks, &result);
                ordered.truncate(top_k);
                return RerankOutcome {
                    chunks: ordered,
                    tier: RerankTier::Race,
                };
            }
            Err(e) => log_tier_failure("race", &TierFailure::from(e), count, started),
        }

        let secondary_started = Instant::now();
        match self.rerank_secondary(query, &chunks).await {
            Ok(order) => {
                info!(
                    "Secondary reranker ordered {}/{count} chunks",
                    order.len()
                );
                let mut slots: Vec<Option<Chunk>> = chunks.into_iter().map(Some).collect();
                let ordered = order
                    .into_iter()
                    .filter_map(|index| slots.get_mut(index).and_then(Option::take))
                    .take(top_k)
                    .collect();
                return RerankOutcome {
                    chunks: ordered,
                    tier: RerankTier::Secondary,
                };
            }
            Err(failure) => log_tier_failure("secondary", &failure, count, secondary_started),
        }

        RerankOutcome {
            chunks: sort_by_score(chunks, top_k),
            tier: RerankTier::ScoreSort,
        }
    }

    async fn rerank_secondary(
        &self,
        query: &str,
        chunks: &[Chunk],
    ) -> Result<Vec<usize>, TierFailure> {
        let Some(ref secondary) = self.secondary else {
            return Err(TierFailure::NotConfigured);
        };

        let texts: Vec<&str> = chunks.iter().map(|chunk| chunk.text.as_str()).collect();
        let order = match tokio::time::timeout(
            self.secondary_timeout,
            secondary.rerank(query, &texts),
        )
        .await
        {
            Ok(Ok(order)) => order,
            Ok(Err(e)) => return Err(TierFailure::Failed(e.to_string())),
            Err(_) => {
                return Err(TierFailure::TimedOut(
                    self.secondary_timeout.as_millis() as u64,
                ))
            }
        };

        let mut seen = HashSet::with_capacity(order.len());
        let order: Vec<usize> = order
            .into_iter()
            .filter(|&index| index < chunks.len() && seen.insert(index))
            .collect();
        if order.is_empty() {
            return Err(TierFailure::Failed(format!(
                "'{}' returned no usable positions",
                secondary.name()
            )));
        }
        Ok(order)
    }
}

fn log_tier_failure(tier: &str, failure: &TierFailure, count: usize, started: Instant) {
    warn!(
        "Rerank tier '{tier}' {failure} ({count} chunks, {}ms elapsed)",
        started.elapsed().as_millis()
    );
}

/// Stable sort by retrieval score descending; missing scores count as zero
/// and NaN scores sort last.
fn sort_by_score(mut chunks: Vec<Chunk>, top_k: usize) -> Vec<Chunk> {
    chunks.sort_by(|a, b| compare_scores_descending(a.score_or_zero(), b.score_or_zero()));
    chunks.truncate(top_k);
    debug!("Score sort kept {} chunks", chunks.len());
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sort_by_score_missing_is_zero_and_stable() {
        let chunks = vec![
            Chunk::vector("a", "a"),
            Chunk::vector("b", "b").with_score(0.5),
            Chunk::graph("c", "c"),
            Chunk::vector("d", "d").with_score(f32::NAN),
            Chunk::vector("e", "e").with_score(-0.1),
        ];
        let sorted = sort_by_score(chunks, 10);
        let ids: Vec<&str> = sorted.iter().map(|c| c.id()).collect();
        assert_eq!(ids, vec!["b", "a", "c", "e", "d"]);
    }

    #[test]
    fn test_tier_display() {
        assert_eq!(RerankTier::ScoreSort.to_string(), "score_sort");
        assert_eq!(TierFailure::TimedOut(2000).to_string(), "timed out after 2000ms");
        assert_eq!(TierFailure::NotConfigured.to_string(), "not configured");
    }
}
