use super::{create_llm, ChatMessage, LLMConfig, LLM};
use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, error, info, warn};

/// Prefix for summaries written without a transcript
pub const NO_TRANSCRIPT_CAVEAT: &str =
    "⚠️⚠️⚠️【注意：無字幕，以下內容為 AI 看標題說故事，僅供參考】⚠️⚠️⚠️\n\n";

const DEFAULT_SYSTEM_PROMPT: &str = "您是一位資深的首席財經分析師。請針對提供的影片標題及字幕內容，撰寫一份精煉的分析。
請直接以「重點列表 (Point Form)」輸出，嚴禁使用任何小標題（如「核心觀點」、「關鍵細節」、「投資評估」等）。
內容應具體描述影片中的關鍵數據、市場動態、明確的投資價值或趨勢預測。請務必提到影片中具體的數字、標的名稱、或特定觀點，絕對避免如「影片提到了數據」、「分析了市場趨勢」等概括、空泛且不具實質內容的描述。
請使用正式繁體中文，總字數控制在 500 字以內。若原始內容為英文，請務必翻譯並以流暢的中文撰寫。若無字幕，請根據標題進行推理並註明「（根據標題深度推演）」。";

/// Produces a summary for a video; never fails past the caller
#[async_trait]
pub trait Summarize: Send + Sync {
    async fn summarize(&self, title: &str, transcript: Option<&str>) -> String;
}

/// LLM-backed video summarizer
pub struct VideoSummarizer {
    llm: Box<dyn LLM>,
    system_prompt: String,
    transcript_char_budget: usize,
}

impl VideoSummarizer {
    /// Create a summarizer from configuration, loading a custom prompt if one is configured
    pub async fn new(config: &LLMConfig) -> Result<Self> {
        let llm = create_llm(config)?;

        let system_prompt = match &config.prompt_file {
            Some(path) if path.exists() => tokio::fs::read_to_string(path)
                .await
                .map(|prompt| prompt.trim().to_string())
                .unwrap_or_else(|e| {
                    warn!("Failed to read prompt file {}: {}, using default prompt", path.display(), e);
                    DEFAULT_SYSTEM_PROMPT.to_string()
                }),
            Some(path) => {
                warn!("Prompt file not found: {}, using default prompt", path.display());
                DEFAULT_SYSTEM_PROMPT.to_string()
            }
            None => DEFAULT_SYSTEM_PROMPT.to_string(),
        };

        info!("✅ Summarizer initialized with {:?} provider ({})", llm.provider_type(), config.model);

        Ok(Self::with_llm(llm, system_prompt, config.transcript_char_budget))
    }

    /// Create a summarizer around an existing LLM
    pub fn with_llm(llm: Box<dyn LLM>, system_prompt: String, transcript_char_budget: usize) -> Self {
        Self {
            llm,
            system_prompt,
            transcript_char_budget,
        }
    }
}

#[async_trait]
impl Summarize for VideoSummarizer {
    async fn summarize(&self, title: &str, transcript: Option<&str>) -> String {
        let messages = vec![
            ChatMessage::system(self.system_prompt.clone()),
            ChatMessage::user(build_user_prompt(title, transcript, self.transcript_char_budget)),
        ];

        match self.llm.chat(messages).await {
            Ok(response) if !response.content.trim().is_empty() => {
                debug!("Summary generated for '{}' (tokens: {:?})", title, response.tokens_used);
                response.content.trim().to_string()
            }
            Ok(_) => {
                warn!("Empty summary returned for {}", title);
                title.to_string()
            }
            Err(e) => {
                error!("Error summarizing {}: {}", title, e);
                title.to_string()
            }
        }
    }
}

/// Build the user prompt, truncating the transcript to the character budget
pub fn build_user_prompt(title: &str, transcript: Option<&str>, char_budget: usize) -> String {
    match transcript {
        Some(text) if !text.is_empty() => {
            let excerpt: String = text.chars().take(char_budget).collect();
            format!("標題：{}\n字幕內容：{}", title, excerpt)
        }
        _ => format!("標題：{}", title),
    }
}

/// Mark a summary that was inferred from the title alone
pub fn with_caveat(summary: &str) -> String {
    format!("{}{}", NO_TRANSCRIPT_CAVEAT, summary)
}
