/// Tube Digest - subscription monitor
///
/// Periodically searches for fresh uploads from a curated channel list, keeps an
/// at-most-once record of what has been processed, summarizes new videos with an
/// LLM and distributes the result through Telegram, a Supabase table and a static page.

pub mod config;
pub mod discovery;
pub mod error;
pub mod llm;
pub mod logging;
pub mod monitor;
pub mod notify;
pub mod publish;
pub mod storage;
pub mod subscriptions;
pub mod sync;
pub mod transcript;

// Re-export main types for easy access
pub use crate::config::{Config, ConfigBuilder};
pub use crate::discovery::{channel_matches, is_recent, parse_search_page, CandidateVideo, VideoSearch, YouTubeSearcher};
pub use crate::error::DigestError;
pub use crate::llm::summarize::{Summarize, VideoSummarizer};
pub use crate::llm::{LLMConfig, LLMProvider};
pub use crate::monitor::{Collaborators, CycleReport, Monitor, MonitorOptions};
pub use crate::notify::{Notifier, TelegramNotifier};
pub use crate::publish::{GitPublisher, PagePublisher};
pub use crate::storage::{ProcessedRecord, RecordHistory, SeenSet};
pub use crate::subscriptions::SubscriptionList;
pub use crate::sync::{RecordStore, SupabaseStore};
pub use crate::transcript::{TranscriptSource, YouTubeTranscripts};
