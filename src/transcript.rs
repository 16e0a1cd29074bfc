use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tracing::{debug, warn};
use yt_transcript_rs::api::YouTubeTranscriptApi;

/// Source of plain-text video transcripts
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Joined transcript text, or None when no transcript is available
    async fn fetch(&self, video_id: &str) -> Option<String>;
}

/// Fetches captions through the public transcript endpoints
pub struct YouTubeTranscripts {
    api: YouTubeTranscriptApi,
    languages: Vec<String>,
}

impl YouTubeTranscripts {
    /// Create a fetcher preferring `languages` in order
    pub fn new(languages: Vec<String>) -> Result<Self> {
        let api = YouTubeTranscriptApi::new(None, None, None)
            .map_err(|e| anyhow!("Failed to initialize transcript client: {}", e))?;

        Ok(Self { api, languages })
    }
}

#[async_trait]
impl TranscriptSource for YouTubeTranscripts {
    async fn fetch(&self, video_id: &str) -> Option<String> {
        let languages: Vec<&str> = self.languages.iter().map(String::as_str).collect();

        match self.api.fetch_transcript(video_id, &languages, false).await {
            Ok(transcript) => {
                debug!(
                    "📜 Transcript for {} in {} ({} snippets)",
                    video_id,
                    transcript.language_code,
                    transcript.snippets.len()
                );
                let text = join_snippets(transcript.text().lines());
                (!text.is_empty()).then_some(text)
            }
            Err(e) => {
                warn!("Error fetching transcript for {}: {}", video_id, e);
                None
            }
        }
    }
}

/// Join caption lines with single spaces, dropping empty ones
pub fn join_snippets<'a, I: IntoIterator<Item = &'a str>>(snippets: I) -> String {
    snippets
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
