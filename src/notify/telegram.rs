use super::{format_message, Notifier};
use crate::config::TelegramConfig;
use crate::error::{DigestError, Result};
use crate::storage::ProcessedRecord;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{error, info, warn};

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'a str>,
    disable_web_page_preview: bool,
}

/// Telegram Bot API notifier bound to a single chat.
///
/// Without a configured chat id, the chat of the latest message sent to the bot is
/// used. A lookup that fails is retried on the next send; once found, the id is kept.
pub struct TelegramNotifier {
    client: Client,
    api_base: String,
    token: String,
    chat_id: OnceCell<String>,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig, token: String, chat_id: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            token,
            chat_id: OnceCell::new_with(chat_id.filter(|id| !id.is_empty())),
        }
    }

    /// Build a notifier and try to resolve its chat id up front.
    /// Returns None only when no bot token is configured.
    pub async fn connect(config: &TelegramConfig) -> Option<Self> {
        let Some(token) = config.bot_token.clone().filter(|t| !t.is_empty()) else {
            info!("Telegram bot token not set, notifications disabled");
            return None;
        };

        let notifier = Self::new(config, token, config.chat_id.clone());
        match notifier.chat_id().await {
            Ok(id) => info!("📨 Sending Telegram notifications to chat {}", id),
            Err(e) => warn!("Telegram chat id unresolved, will retry on the next message: {}", e),
        }

        Some(notifier)
    }

    /// Configured or previously resolved chat id, looking it up if neither exists
    pub async fn chat_id(&self) -> Result<&str> {
        let id = self
            .chat_id
            .get_or_try_init(|| async {
                let id = self.latest_chat_id().await?.ok_or_else(|| {
                    DigestError::Telegram(
                        "chat id not found. Please send a message to the bot first.".to_string(),
                    )
                })?;
                info!("📨 Automatically detected Telegram chat id: {}", id);
                Ok::<_, DigestError>(id)
            })
            .await?;

        Ok(id.as_str())
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    /// Chat id of the most recent message sent to the bot
    pub async fn latest_chat_id(&self) -> Result<Option<String>> {
        let response: Value = self
            .client
            .get(self.method_url("getUpdates"))
            .send()
            .await?
            .json()
            .await?;

        if response["ok"].as_bool() != Some(true) {
            return Err(DigestError::Telegram(format!("getUpdates rejected: {}", response)));
        }

        let chat_id = response["result"]
            .as_array()
            .and_then(|updates| updates.last())
            .map(|update| &update["message"]["chat"]["id"])
            .and_then(|id| match id {
                Value::Number(n) => Some(n.to_string()),
                Value::String(s) => Some(s.clone()),
                _ => None,
            });

        Ok(chat_id)
    }

    /// Send one message; `parse_mode` None sends plain text
    pub async fn send_message(&self, chat_id: &str, text: &str, parse_mode: Option<&str>) -> Result<()> {
        let request = SendMessageRequest {
            chat_id,
            text,
            parse_mode,
            disable_web_page_preview: false,
        };

        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DigestError::Telegram(format!("HTTP {}: {}", status, body)));
        }

        Ok(())
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, record: &ProcessedRecord) -> Result<()> {
        let chat_id = self.chat_id().await?;
        let message = format_message(record);
        let text = message.as_str();
        deliver_with_fallback(move |mode| self.send_message(chat_id, text, mode)).await
    }
}

/// Send as HTML, retrying once as plain text if that fails
pub async fn deliver_with_fallback<F, Fut>(mut send: F) -> Result<()>
where
    F: FnMut(Option<&'static str>) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    match send(Some("HTML")).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("Failed to send Telegram message (HTML): {}", e);
            send(None).await?;
            info!("Sent Telegram message using plain text fallback");
            Ok(())
        }
    }
}
