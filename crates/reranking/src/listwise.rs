//! Listwise reranking with a chat model
//!
//! The model sees every passage numbered `[1]..[n]` and answers with the
//! numbers in preference order. Its reply is free text, so the ordering is
//! recovered by pattern matching rather than structured decoding.

use crate::error::RerankingError;
use crate::{truncate_for_reranking, Reranker};
use async_trait::async_trait;
use hybridrag_core::error::Result;
use regex::Regex;
use std::collections::HashSet;
use std::sync::{Arc, LazyLock};
use tracing::{debug, info};

const LISTWISE_PROMPT: &str = include_str!("../assets/prompts/listwise_rerank.txt");

/// Passages are shortened harder than for cross-encoders; all of them share one prompt
const MAX_PASSAGE_CHARS: usize = 1_200;

const MAX_RESPONSE_TOKENS: u32 = 256;

static RANK_TOKEN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\[(\d+)\]").ok());

/// Parse `[n]` tokens from free text into 0-based positions.
///
/// Numbers are 1-based in the text. Out-of-range numbers are dropped and
/// repeats keep their first position. The result may cover only part of
/// the input.
pub fn parse_bracketed_ranking(text: &str, count: usize) -> Vec<usize> {
    let Some(pattern) = RANK_TOKEN.as_ref() else {
        return Vec::new();
    };
    let mut seen = HashSet::new();
    pattern
        .captures_iter(text)
        .filter_map(|cap| cap.get(1)?.as_str().parse::<usize>().ok())
        .filter(|n| (1..=count).contains(n))
        .map(|n| n - 1)
        .filter(|index| seen.insert(*index))
        .collect()
}

fn format_prompt(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{key}}}"), value);
    }
    result
}

/// Reranker that asks an Anthropic model for a listwise ordering
pub struct ListwiseReranker {
    name: String,
    client: Arc<claudius::Anthropic>,
    model: claudius::Model,
}

impl ListwiseReranker {
    pub fn new(name: String, api_key: String, model: String) -> Result<Self> {
        info!("Initializing LLM listwise reranker");
        info!("  Model: {model}");

        let client = claudius::Anthropic::new(Some(api_key)).map_err(|e| {
            RerankingError::ConfigError(format!("Failed to create Anthropic client: {e}"))
        })?;

        Ok(Self {
            name,
            client: Arc::new(client),
            model: claudius::Model::Custom(model),
        })
    }

    fn build_prompt(query: &str, documents: &[&str]) -> String {
        let passages = documents
            .iter()
            .enumerate()
            .map(|(i, doc)| {
                format!(
                    "[{}] {}",
                    i + 1,
                    truncate_for_reranking(doc, MAX_PASSAGE_CHARS)
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        format_prompt(
            LISTWISE_PROMPT,
            &[
                ("query", query),
                ("passages", &passages),
                ("count", &documents.len().to_string()),
            ],
        )
    }
}

#[async_trait]
impl Reranker for ListwiseReranker {
    fn name(&self) -> &str {
        &self.name
    }

    async fn rerank(&self, query: &str, documents: &[&str]) -> Result<Vec<usize>> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let mut params = claudius::MessageCreateParams::simple(
            claudius::MessageParam::user(Self::build_prompt(query, documents)),
            self.model.clone(),
        );
        params.max_tokens = MAX_RESPONSE_TOKENS;
        params.temperature = Some(0.0);

        let response = self.client.send(params).await.map_err(|e| {
            RerankingError::InferenceError(format!("Listwise rerank call failed: {e}"))
        })?;

        let response_text = response
            .content
            .iter()
            .filter_map(|block| match block {
                claudius::ContentBlock::Text(text_block) => Some(text_block.text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n");

        let ranking = parse_bracketed_ranking(&response_text, documents.len());
        if ranking.is_empty() {
            return Err(RerankingError::ParseError(format!(
                "no passage numbers in model reply: {}",
                truncate_for_reranking(&response_text, 200)
            ))
            .into());
        }

        debug!(
            "Listwise rerank parsed {}/{} positions",
            ranking.len(),
            documents.len()
        );
        Ok(ranking)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_converts_to_zero_based() {
        assert_eq!(parse_bracketed_ranking("[3] [1] [2]", 3), vec![2, 0, 1]);
    }

    #[test]
    fn test_parse_drops_repeats_and_out_of_range() {
        let text = "Best is [2], then [2] again, [0], [9] and finally [1].";
        assert_eq!(parse_bracketed_ranking(text, 3), vec![1, 0]);
    }

    #[test]
    fn test_parse_nothing_recognisable() {
        assert!(parse_bracketed_ranking("passage two is best", 3).is_empty());
        assert!(parse_bracketed_ranking("[a] [b]", 3).is_empty());
    }

    #[test]
    fn test_prompt_numbers_passages_from_one() {
        let prompt = ListwiseReranker::build_prompt("why?", &["first", "second"]);
        assert!(prompt.contains("[1] first"));
        assert!(prompt.contains("[2] second"));
        assert!(prompt.contains("Rank ALL 2 passages"));
        assert!(prompt.contains("why?"));
    }
}
