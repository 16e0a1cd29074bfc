use super::{ChatMessage, LLM, LLMConfig, LLMProvider, LLMResponse};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Chat-completions provider (DeepSeek, OpenAI and LM Studio share the format)
pub struct ChatCompletionsProvider {
    config: LLMConfig,
    endpoint: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct ChatCompletionsRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionsResponse {
    choices: Vec<ChatCompletionsChoice>,
    usage: Option<ChatCompletionsUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionsChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionsUsage {
    total_tokens: u32,
}

impl ChatCompletionsProvider {
    pub fn new(config: LLMConfig) -> Result<Self> {
        if config.provider != LLMProvider::LMStudio && config.api_key.is_none() {
            return Err(anyhow!("{:?} API key required", config.provider));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        let endpoint = config.endpoint();

        Ok(Self { config, endpoint, client })
    }
}

#[async_trait]
impl LLM for ChatCompletionsProvider {
    async fn chat(&self, messages: Vec<ChatMessage>) -> Result<LLMResponse> {
        let request = ChatCompletionsRequest {
            model: self.config.model.clone(),
            messages,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        debug!("Sending request to {:?} at {}", self.config.provider, self.endpoint);

        let mut builder = self.client.post(&self.endpoint).json(&request);
        if let Some(api_key) = &self.config.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("{:?} API error {}: {}", self.config.provider, status, text));
        }

        let completion: ChatCompletionsResponse = response.json().await?;

        let content = completion
            .choices
            .first()
            .ok_or_else(|| anyhow!("No response from {:?}", self.config.provider))?
            .message
            .content
            .clone();

        let tokens_used = completion.usage.map(|u| u.total_tokens);

        Ok(LLMResponse {
            content,
            tokens_used,
        })
    }

    fn provider_type(&self) -> LLMProvider {
        self.config.provider.clone()
    }
}
