//! First-valid-wins race between reranking strategies

use crate::error::RaceError;
use crate::Reranker;
use futures::stream::{FuturesUnordered, StreamExt};
use hybridrag_core::{Chunk, RankMeta, RerankRaceResult};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Winner name reported when there was nothing to rank
const IDENTITY_STRATEGY: &str = "identity";

/// Races independent rerankers against one shared deadline
///
/// Strategies are polled as un-spawned futures inside a single
/// `FuturesUnordered`. When the race returns, whether through a winner or
/// the deadline, the set is dropped and every request still in flight is
/// cancelled with it.
pub struct RerankRace {
    strategies: Vec<Arc<dyn Reranker>>,
    deadline: Duration,
}

impl RerankRace {
    pub fn new(strategies: Vec<Arc<dyn Reranker>>, deadline: Duration) -> Self {
        Self {
            strategies,
            deadline,
        }
    }

    pub fn strategy_count(&self) -> usize {
        self.strategies.len()
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Run every strategy over `chunks` and return the first valid ordering.
    ///
    /// A strategy's answer is valid when at least one in-range position
    /// survives deduplication. The first strategy to settle decides the
    /// race: a valid answer wins, while an error or an invalid answer fails
    /// the whole race at once and abandons every strategy still pending.
    /// The race also fails when the deadline passes first. The winning
    /// ordering is padded to cover every input position.
    pub async fn race(
        &self,
        query: &str,
        chunks: &[Chunk],
    ) -> Result<RerankRaceResult, RaceError> {
        let count = chunks.len();
        if count <= 1 {
            return Ok(RerankRaceResult {
                ordered_indices: (0..count).collect(),
                winner_strategy: IDENTITY_STRATEGY.to_string(),
                latency_ms: 0,
            });
        }
        if self.strategies.is_empty() {
            return Err(RaceError::NoStrategies);
        }

        let texts: Vec<&str> = chunks.iter().map(|chunk| chunk.text.as_str()).collect();
        let texts = texts.as_slice();
        let started = Instant::now();

        let mut in_flight: FuturesUnordered<_> = self
            .strategies
            .iter()
            .map(|strategy| async move {
                let result = strategy.rerank(query, texts).await;
                (strategy.name(), result)
            })
            .collect();
        let attempted = in_flight.len();

        let first_settled = async {
            let (name, result) = in_flight.next().await?;
            let outcome = match result {
                Ok(order) => {
                    let order = sanitize_order(order, count);
                    if order.is_empty() {
                        Err("returned no usable positions".to_string())
                    } else {
                        Ok(order)
                    }
                }
                Err(e) => Err(e.to_string()),
            };
            Some((name, outcome))
        };

        match tokio::time::timeout(self.deadline, first_settled).await {
            Ok(Some((name, Ok(order)))) => {
                let latency_ms = started.elapsed().as_millis() as u64;
                info!(
                    "Reranker '{name}' won race over {attempted} strategies in {latency_ms}ms ({}/{count} positions ranked)",
                    order.len()
                );
                Ok(RerankRaceResult {
                    ordered_indices: pad_permutation(order, count),
                    winner_strategy: name.to_string(),
                    latency_ms,
                })
            }
            Ok(Some((name, Err(reason)))) => {
                warn!(
                    "Reranker '{name}' failed after {}ms, abandoning race: {reason}",
                    started.elapsed().as_millis()
                );
                Err(RaceError::Failed {
                    strategy: name.to_string(),
                    reason,
                })
            }
            Ok(None) => Err(RaceError::NoStrategies),
            Err(_) => {
                debug!("Race deadline elapsed with {attempted} strategies outstanding");
                Err(RaceError::Timeout {
                    deadline_ms: self.deadline.as_millis() as u64,
                })
            }
        }
    }
}

/// Keep in-range positions, first occurrence only
fn sanitize_order(order: Vec<usize>, count: usize) -> Vec<usize> {
    let mut seen = HashSet::with_capacity(order.len());
    order
        .into_iter()
        .filter(|&index| index < count && seen.insert(index))
        .collect()
}

/// Complete a partial ranking by appending every unranked position in
/// its original relative order.
///
/// This is a policy choice: a partial ranking is trusted for the
/// positions it names and the rest keep retrieval order behind them.
/// Treating partial rankings as failures instead would mean changing the
/// validity rule in [`RerankRace::race`], not this function.
pub fn pad_permutation(order: Vec<usize>, count: usize) -> Vec<usize> {
    let mut ranked = vec![false; count];
    let mut padded = Vec::with_capacity(count);
    for index in order {
        if index < count && !ranked[index] {
            ranked[index] = true;
            padded.push(index);
        }
    }
    padded.extend((0..count).filter(|&index| !ranked[index]));
    padded
}

/// Reorder `chunks` by a race result and mark the new top chunk with
/// the winning strategy and its latency.
pub fn apply_race_result(chunks: Vec<Chunk>, result: &RerankRaceResult) -> Vec<Chunk> {
    let mut slots: Vec<Option<Chunk>> = chunks.into_iter().map(Some).collect();
    let mut ordered: Vec<Chunk> = result
        .ordered_indices
        .iter()
        .filter_map(|&index| slots.get_mut(index).and_then(Option::take))
        .collect();
    // A result that skipped positions still must not lose chunks
    ordered.extend(slots.into_iter().flatten());

    if let Some(top) = ordered.first_mut() {
        top.annotate_rank(RankMeta {
            winner_strategy: result.winner_strategy.clone(),
            latency_ms: result.latency_ms,
        });
    }
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_pad_permutation_appends_in_original_order() {
        assert_eq!(pad_permutation(vec![3, 1], 5), vec![3, 1, 0, 2, 4]);
        assert_eq!(pad_permutation(vec![], 3), vec![0, 1, 2]);
        assert_eq!(pad_permutation(vec![2, 2, 7, 0], 3), vec![2, 0, 1]);
    }

    #[test]
    fn test_sanitize_order() {
        assert_eq!(sanitize_order(vec![4, 1, 1, 9, 0], 5), vec![4, 1, 0]);
        assert!(sanitize_order(vec![5, 6], 5).is_empty());
    }

    #[test]
    fn test_apply_race_result_annotates_only_top() {
        let chunks = vec![
            Chunk::vector("a", "alpha"),
            Chunk::vector("b", "beta"),
            Chunk::graph("c", "gamma"),
        ];
        let result = RerankRaceResult {
            ordered_indices: vec![2, 0, 1],
            winner_strategy: "jina".to_string(),
            latency_ms: 42,
        };

        let ordered = apply_race_result(chunks, &result);
        let ids: Vec<&str> = ordered.iter().map(|c| c.id()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);

        let meta = ordered[0].rank_meta().unwrap();
        assert_eq!(meta.winner_strategy, "jina");
        assert_eq!(meta.latency_ms, 42);
        assert!(ordered[1..].iter().all(|c| c.rank_meta().is_none()));
    }
}
