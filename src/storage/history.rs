use super::atomic::{read_json_or, write_json_atomic};
use crate::discovery::{watch_url, CandidateVideo};
use crate::error::Result;
use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tracing::info;

/// Format of `processed_at`, matching existing record files
pub const PROCESSED_AT_FORMAT: &str = "%m-%d %H:%M";

/// A video that was accepted, summarized and recorded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedRecord {
    pub id: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub channel: String,

    /// Relative publish time as displayed when the video was found
    #[serde(rename = "time", default)]
    pub published_time_text: String,

    #[serde(default)]
    pub summary: String,

    #[serde(default)]
    pub processed_at: String,
}

impl ProcessedRecord {
    pub fn new<Tz: TimeZone>(candidate: CandidateVideo, summary: String, processed_at: DateTime<Tz>) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        Self {
            id: candidate.id,
            title: candidate.title,
            channel: candidate.channel,
            published_time_text: candidate.published_time_text,
            summary,
            processed_at: processed_at.format(PROCESSED_AT_FORMAT).to_string(),
        }
    }

    pub fn watch_url(&self) -> String {
        watch_url(&self.id)
    }

    /// Summary length in characters
    pub fn summary_chars(&self) -> usize {
        self.summary.chars().count()
    }
}

/// Append-only record history keeping the most recent `limit` entries
#[derive(Debug, Clone)]
pub struct RecordHistory {
    path: PathBuf,
    records: VecDeque<ProcessedRecord>,
    limit: usize,
}

impl RecordHistory {
    pub fn new(path: PathBuf, limit: usize) -> Self {
        Self {
            path,
            records: VecDeque::new(),
            limit,
        }
    }

    /// Load history from `path`; a missing or corrupt file yields an empty history
    pub fn load(path: &Path, limit: usize) -> Self {
        let stored: Vec<ProcessedRecord> = read_json_or(path, Vec::new());

        let mut history = Self::new(path.to_path_buf(), limit);
        history.extend(stored);

        info!("📚 Loaded {} processed records from {}", history.len(), path.display());
        history
    }

    /// Append records in arrival order, evicting the oldest beyond the limit
    pub fn extend<I: IntoIterator<Item = ProcessedRecord>>(&mut self, records: I) {
        self.records.extend(records);
        while self.records.len() > self.limit {
            self.records.pop_front();
        }
    }

    /// Up to `count` most recent records, newest first
    pub fn recent(&self, count: usize) -> Vec<&ProcessedRecord> {
        self.records.iter().rev().take(count).collect()
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.records.iter().any(|record| record.id == id)
    }

    /// Write the full history atomically
    pub fn persist(&self) -> Result<()> {
        let records: Vec<&ProcessedRecord> = self.records.iter().collect();
        write_json_atomic(&self.path, &records)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records oldest first
    pub fn iter(&self) -> impl Iterator<Item = &ProcessedRecord> {
        self.records.iter()
    }
}
