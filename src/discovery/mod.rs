/// Video discovery
///
/// Turns a subscription name into fresh, correctly attributed upload candidates:
/// the search page is fetched and parsed, stale uploads are dropped by their
/// relative publish time, and channel names are fuzzy-matched against the query.

pub mod extract;
pub mod matcher;
pub mod recency;
pub mod search;

// Re-export main types
pub use matcher::channel_matches;
pub use recency::is_recent;
pub use search::{parse_search_page, VideoSearch, YouTubeSearcher};

use serde::{Deserialize, Serialize};

/// A video found in search results, before any filtering by channel or history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateVideo {
    /// Stable video identifier
    pub id: String,
    pub title: String,
    /// Channel name as displayed in the results
    pub channel: String,
    /// Relative publish time as displayed, e.g. "3 days ago"
    #[serde(rename = "time")]
    pub published_time_text: String,
}

impl CandidateVideo {
    pub fn watch_url(&self) -> String {
        watch_url(&self.id)
    }
}

/// Public watch page for a video id
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}
