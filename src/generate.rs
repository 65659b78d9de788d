//! Answer generator gateway.
//!
//! Thin boundary from an assembled prompt to answer text. Like the
//! embedding gateway, it performs one blocking request per call, maps
//! HTTP 429 to [`BotError::Quota`], and leaves retry policy to callers.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::Deserialize;

use crate::config::GenerationConfig;
use crate::error::BotError;

/// Produces answer text from a fully assembled prompt.
#[async_trait]
pub trait AnswerGateway: Send + Sync {
    /// Returns the model identifier (e.g. `"gpt-4o-mini"`).
    fn model_name(&self) -> &str;
    /// Generate an answer for the given prompt.
    async fn generate(&self, prompt: &str) -> Result<String, BotError>;
}

/// A no-op gateway that always fails. Used when
/// `generation.provider = "disabled"` in the configuration.
pub struct DisabledGenerator;

#[async_trait]
impl AnswerGateway for DisabledGenerator {
    fn model_name(&self) -> &str {
        "disabled"
    }
    async fn generate(&self, _prompt: &str) -> Result<String, BotError> {
        Err(BotError::Provider(
            "generation provider is disabled".to_string(),
        ))
    }
}

/// Answer gateway for OpenAI-compatible `POST /v1/chat/completions`
/// endpoints. Requires the `OPENAI_API_KEY` environment variable.
pub struct OpenAiGenerator {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
}

#[derive(Deserialize)]
struct ChatCompletionsResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

impl OpenAiGenerator {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow::anyhow!("generation.model required for OpenAI provider"))?;
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY environment variable not set"))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key,
            model,
        })
    }
}

#[async_trait]
impl AnswerGateway for OpenAiGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, BotError> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.api_base))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| BotError::Provider(format!("generation request failed: {e}")))?;

        let status = response.status();
        if status.as_u16() == 429 {
            let detail = response.text().await.unwrap_or_default();
            return Err(BotError::Quota(format!("generation API: {detail}")));
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(BotError::Provider(format!(
                "generation API error {status}: {detail}"
            )));
        }

        let parsed: ChatCompletionsResponse = response
            .json()
            .await
            .map_err(|e| BotError::Provider(format!("invalid generation response: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| BotError::Provider("generation API returned no choices".to_string()))
    }
}

/// Create the appropriate [`AnswerGateway`] based on configuration.
pub fn create_generator(config: &GenerationConfig) -> Result<Arc<dyn AnswerGateway>> {
    match config.provider.as_str() {
        "disabled" => Ok(Arc::new(DisabledGenerator)),
        "openai" => Ok(Arc::new(OpenAiGenerator::new(config)?)),
        other => bail!("Unknown generation provider: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_generator_refuses() {
        let result = DisabledGenerator.generate("any prompt").await;
        assert!(matches!(result, Err(BotError::Provider(_))));
    }
}
