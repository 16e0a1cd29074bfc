/// Per-video notifications
pub mod telegram;

pub use telegram::TelegramNotifier;

use crate::error::Result;
use crate::storage::ProcessedRecord;
use async_trait::async_trait;

/// Delivers a message announcing one newly processed video
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, record: &ProcessedRecord) -> Result<()>;
}

/// Escape text for Telegram's HTML parse mode
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Render the HTML notification for a record
pub fn format_message(record: &ProcessedRecord) -> String {
    format!(
        "<b>📌 主題：{title}</b>\n\n\
         📺 <b>頻道</b>: {channel}\n\
         ⏱️ <b>時間</b>: {time}\n\
         🔄 <b>抓取</b>: {processed_at}\n\
         📝 <b>字數</b>: {chars}\n\n\
         {summary}\n\n\
         🔗 <a href='{url}'>觀看影片</a>",
        title = html_escape(&record.title),
        channel = html_escape(&record.channel),
        time = html_escape(or_unknown(&record.published_time_text)),
        processed_at = html_escape(or_unknown(&record.processed_at)),
        chars = record.summary_chars(),
        summary = html_escape(&record.summary),
        url = record.watch_url(),
    )
}

fn or_unknown(value: &str) -> &str {
    if value.is_empty() {
        "未知"
    } else {
        value
    }
}
