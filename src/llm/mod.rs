pub mod providers;
pub mod summarize;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// LLM provider types; all speak the chat-completions wire format
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum LLMProvider {
    DeepSeek,
    OpenAI,
    LMStudio,
}

impl LLMProvider {
    /// Chat-completions endpoint used when none is configured
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            LLMProvider::DeepSeek => "https://api.deepseek.com/chat/completions",
            LLMProvider::OpenAI => "https://api.openai.com/v1/chat/completions",
            LLMProvider::LMStudio => "http://localhost:1234/v1/chat/completions",
        }
    }
}

/// LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    pub provider: LLMProvider,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_seconds: u64,
    /// Transcript characters sent along with the title
    pub transcript_char_budget: usize,
    /// Optional override for the built-in system prompt
    pub prompt_file: Option<PathBuf>,
}

impl LLMConfig {
    pub fn endpoint(&self) -> String {
        self.endpoint
            .clone()
            .unwrap_or_else(|| self.provider.default_endpoint().to_string())
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: LLMProvider::DeepSeek,
            endpoint: None,
            api_key: None,
            model: "deepseek-chat".to_string(),
            max_tokens: 1500,
            temperature: 0.7,
            timeout_seconds: 45,
            transcript_char_budget: 8000,
            prompt_file: None,
        }
    }
}

/// Chat message for LLM communication
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }
}

/// LLM response
#[derive(Debug, Clone)]
pub struct LLMResponse {
    pub content: String,
    pub tokens_used: Option<u32>,
}

/// Trait for LLM providers
#[async_trait]
pub trait LLM: Send + Sync {
    async fn chat(&self, messages: Vec<ChatMessage>) -> Result<LLMResponse>;
    fn provider_type(&self) -> LLMProvider;
}

/// Create LLM instance based on configuration
pub fn create_llm(config: &LLMConfig) -> Result<Box<dyn LLM>> {
    Ok(Box::new(providers::ChatCompletionsProvider::new(config.clone())?))
}
