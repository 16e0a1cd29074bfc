use crate::error::{DigestError, Result};
use crate::storage::atomic::write_atomic;
use crate::storage::{ProcessedRecord, RecordHistory};
use regex::{NoExpand, Regex};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::LazyLock;
use tracing::info;

static VIDEOS_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)const videos = \[.*?\];").expect("videos pattern is valid"));

/// One card on the dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageEntry {
    pub summary: String,
    pub channel: String,
    pub url: String,
}

impl From<&ProcessedRecord> for PageEntry {
    fn from(record: &ProcessedRecord) -> Self {
        let header = format!(
            "【⏱️ {} | 🔄 {} | 📝 {} 字】",
            or(&record.published_time_text, "未知"),
            or(&record.processed_at, "未知"),
            record.summary_chars()
        );

        Self {
            summary: format!(
                "📌 主題：{}\n\n{}\n\n{}",
                or(&record.title, "無標題"),
                header,
                or(&record.summary, "無摘要")
            ),
            channel: or(&record.channel, "未知頻道").to_string(),
            url: record.watch_url(),
        }
    }
}

fn or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() {
        fallback
    } else {
        value
    }
}

/// Rewrites the videos literal inside the dashboard page
#[derive(Debug, Clone)]
pub struct PagePublisher {
    page_path: PathBuf,
    recent_count: usize,
}

impl PagePublisher {
    pub fn new(page_path: PathBuf, recent_count: usize) -> Self {
        Self {
            page_path,
            recent_count,
        }
    }

    /// Show the newest records, newest first
    pub fn update(&self, history: &RecordHistory) -> Result<()> {
        let entries: Vec<PageEntry> = history
            .recent(self.recent_count)
            .into_iter()
            .map(PageEntry::from)
            .collect();

        self.write_entries(&entries)?;
        info!("🌐 Updated {} with {} entries", self.page_path.display(), entries.len());
        Ok(())
    }

    /// Reset the page to an empty list
    pub fn clear(&self) -> Result<()> {
        self.write_entries(&[])
    }

    fn write_entries(&self, entries: &[PageEntry]) -> Result<()> {
        if !self.page_path.exists() {
            return Err(DigestError::Publish(format!(
                "Website file not found at {}",
                self.page_path.display()
            )));
        }

        let html = std::fs::read_to_string(&self.page_path)?;
        let updated = replace_videos(&html, entries)?.ok_or_else(|| {
            DigestError::Publish(format!(
                "Could not find 'const videos = [...];' in {}",
                self.page_path.display()
            ))
        })?;

        write_atomic(&self.page_path, updated.as_bytes())
    }
}

/// Substitute the videos literal; None when the page has no such literal
pub fn replace_videos(html: &str, entries: &[PageEntry]) -> Result<Option<String>> {
    if !VIDEOS_LITERAL.is_match(html) {
        return Ok(None);
    }

    // `</script>` inside a summary must not close the surrounding script element
    let json = serde_json::to_string(entries)?.replace("</", "<\\/");
    let replacement = format!("const videos = {};", json);

    Ok(Some(VIDEOS_LITERAL.replace_all(html, NoExpand(&replacement)).into_owned()))
}
