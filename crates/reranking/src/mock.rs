//! Scripted reranker for testing races and fallbacks

use crate::Reranker;
use async_trait::async_trait;
use hybridrag_core::error::{Error, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// What a [`MockReranker`] does when called
#[derive(Debug, Clone)]
pub enum MockRerankerBehavior {
    /// Return this ordering
    Order(Vec<usize>),
    /// Return the input positions reversed
    Reverse,
    /// Fail with an upstream error
    Fail(String),
    /// Fail as if the reply could not be parsed
    Unparseable,
    /// Never return
    Hang,
}

/// Reranker whose answer and latency are fixed up front
pub struct MockReranker {
    name: String,
    behavior: MockRerankerBehavior,
    delay: Duration,
    calls: AtomicUsize,
}

impl MockReranker {
    pub fn new(name: impl Into<String>, behavior: MockRerankerBehavior) -> Self {
        Self {
            name: name.into(),
            behavior,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    /// Wait this long before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Reranker for MockReranker {
    fn name(&self) -> &str {
        &self.name
    }

    async fn rerank(&self, _query: &str, documents: &[&str]) -> Result<Vec<usize>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match &self.behavior {
            MockRerankerBehavior::Order(order) => Ok(order.clone()),
            MockRerankerBehavior::Reverse => Ok((0..documents.len()).rev().collect()),
            MockRerankerBehavior::Fail(message) => Err(Error::reranking(message.clone())),
            MockRerankerBehavior::Unparseable => Err(Error::parse("no ranking in reply")),
            MockRerankerBehavior::Hang => {
                std::future::pending::<()>().await;
                Ok(Vec::new())
            }
        }
    }
}
