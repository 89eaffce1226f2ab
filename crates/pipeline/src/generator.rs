//! Generation backends

use crate::error::PipelineError;
use async_trait::async_trait;
use hybridrag_core::config::GenerationConfig;
use hybridrag_core::error::{Error, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::info;

/// A text completion backend
#[async_trait]
pub trait Generator: Send + Sync {
    /// Complete `user_prompt` under `system_prompt` and return the reply text.
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;
}

/// Create the generation backend named by the configuration
///
/// The Anthropic backend needs an API key from the config or the
/// ANTHROPIC_API_KEY environment variable; without one this fails
/// before any request is made.
pub fn create_generator(config: &GenerationConfig) -> std::result::Result<Arc<dyn Generator>, PipelineError> {
    match config.provider.as_str() {
        "anthropic" => {
            let api_key = config
                .resolve_api_key()
                .ok_or_else(|| PipelineError::MissingApiKey(config.provider.clone()))?;
            Ok(Arc::new(AnthropicGenerator::new(api_key, config)?))
        }
        "mock" => Ok(Arc::new(MockGenerator::citing_sources())),
        other => Err(PipelineError::Config(format!(
            "Unknown generation provider: '{other}'. Valid providers: anthropic, mock"
        ))),
    }
}

/// Generator backed by the Anthropic Messages API
pub struct AnthropicGenerator {
    client: Arc<claudius::Anthropic>,
    model: claudius::Model,
    max_tokens: u32,
    temperature: f32,
}

impl std::fmt::Debug for AnthropicGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicGenerator")
            .field("client", &"<Anthropic>")
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl AnthropicGenerator {
    pub fn new(
        api_key: String,
        config: &GenerationConfig,
    ) -> std::result::Result<Self, PipelineError> {
        info!("Initializing Anthropic generator");
        info!("  Model: {}", config.model);
        info!("  Max tokens: {}", config.max_tokens);

        let client = claudius::Anthropic::new(Some(api_key)).map_err(|e| {
            PipelineError::Config(format!("Failed to create Anthropic client: {e}"))
        })?;

        Ok(Self {
            client: Arc::new(client),
            model: claudius::Model::Custom(config.model.clone()),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl Generator for AnthropicGenerator {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let params = claudius::MessageCreateParams::new(
            self.max_tokens,
            vec![claudius::MessageParam::user(user_prompt.to_string())],
            self.model.clone(),
        )
        .with_system_blocks(vec![claudius::TextBlock::new(system_prompt.to_string())])
        .with_temperature(self.temperature)
        .map_err(|e| Error::generation(format!("Invalid temperature: {e}")))?;

        let response = self
            .client
            .send(params)
            .await
            .map_err(|e| Error::generation(format!("Anthropic API call failed: {e}")))?;

        Ok(response
            .content
            .iter()
            .filter_map(|block| match block {
                claudius::ContentBlock::Text(text_block) => Some(text_block.text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

#[derive(Debug, Clone)]
enum MockReply {
    Fixed(String),
    CiteSources,
    Fail(String),
}

/// In-process generator for tests and offline runs
pub struct MockGenerator {
    reply: MockReply,
    calls: AtomicUsize,
    last_user_prompt: Mutex<Option<String>>,
}

impl MockGenerator {
    fn with_reply(reply: MockReply) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
            last_user_prompt: Mutex::new(None),
        }
    }

    /// Always answer with `text`
    pub fn replying(text: impl Into<String>) -> Self {
        Self::with_reply(MockReply::Fixed(text.into()))
    }

    /// Answer by citing every source header found in the prompt
    pub fn citing_sources() -> Self {
        Self::with_reply(MockReply::CiteSources)
    }

    /// Fail every call with `message`
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_reply(MockReply::Fail(message.into()))
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_user_prompt(&self) -> Option<String> {
        self.last_user_prompt
            .lock()
            .ok()
            .and_then(|prompt| prompt.clone())
    }
}

#[async_trait]
impl Generator for MockGenerator {
    async fn complete(&self, _system_prompt: &str, user_prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_user_prompt.lock() {
            *last = Some(user_prompt.to_string());
        }

        match &self.reply {
            MockReply::Fixed(text) => Ok(text.clone()),
            MockReply::Fail(message) => Err(Error::generation(message.clone())),
            MockReply::CiteSources => {
                let citations: Vec<&str> = user_prompt
                    .lines()
                    .filter(|line| line.starts_with("[Source:"))
                    .filter_map(|line| line.split(']').next())
                    .map(|header| header.trim_start_matches('['))
                    .collect();
                Ok(format!(
                    "Answer drawn from the retrieved context. {}",
                    citations
                        .iter()
                        .map(|c| format!("[{c}]"))
                        .collect::<Vec<_>>()
                        .join(" ")
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_anthropic_key_fails_fast() {
        if std::env::var("ANTHROPIC_API_KEY").is_ok() {
            return;
        }
        let err = create_generator(&GenerationConfig::default()).err().unwrap();
        assert!(matches!(err, PipelineError::MissingApiKey(ref p) if p == "anthropic"));
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let config = GenerationConfig {
            provider: "openai".to_string(),
            ..GenerationConfig::default()
        };
        assert!(matches!(
            create_generator(&config),
            Err(PipelineError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_citing_mock_cites_prompt_headers() {
        let generator = MockGenerator::citing_sources();
        let prompt = "[Source: a] (Origin: Vector-Chunk)\nalpha\n\n[Source: graph:d1:n2] (Origin: Graph-Node)\nDocument: D";
        let reply = generator.complete("system", prompt).await.unwrap();
        assert!(reply.contains("[Source: a]"));
        assert!(reply.contains("[Source: graph:d1:n2]"));
        assert_eq!(generator.call_count(), 1);
        assert_eq!(generator.last_user_prompt().as_deref(), Some(prompt));
    }
}
