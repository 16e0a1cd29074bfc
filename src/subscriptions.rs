use rand::seq::IndexedRandom;
use rand::Rng;
use std::path::Path;
use tracing::{info, warn};

/// Finance and crypto keywords used when none are configured
pub const DEFAULT_RELEVANCE_KEYWORDS: &[&str] = &[
    "股市", "財經", "投資", "比特幣", "加密", "美股", "港股", "幣圈", "金融",
    "Bitcoin", "Crypto", "Stock", "Market", "BTC", "ETH", "ADA", "XRP",
    "分析", "行情", "策略", "金", "銀", "油",
    "Money", "Wealth", "Trading", "Invest", "Finance", "Economics", "Dividend",
    "Option", "Future", "Fund", "Business", "Capital", "Asset",
];

/// Subscribed channel names selected for monitoring
#[derive(Debug, Clone, Default)]
pub struct SubscriptionList {
    channels: Vec<String>,
}

impl SubscriptionList {
    pub fn new(channels: Vec<String>) -> Self {
        Self { channels }
    }

    /// Load the subscription file, keeping relevant channels only.
    ///
    /// A missing or unreadable file is not fatal; the monitor then idles.
    pub async fn load(path: &Path, keywords: &[String]) -> Self {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => {
                let list = Self::parse(&content, keywords);
                info!("📺 Monitoring {} relevant subscriptions from {}", list.len(), path.display());
                list
            }
            Err(e) => {
                warn!("Subscription file {} unavailable: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parse one channel per line, skipping blanks and `#` comments.
    ///
    /// With an empty keyword list every channel is kept.
    pub fn parse(content: &str, keywords: &[String]) -> Self {
        let keywords: Vec<String> = keywords.iter().map(|k| k.to_lowercase()).collect();

        let channels = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter(|line| is_relevant(line, &keywords))
            .map(str::to_string)
            .collect();

        Self { channels }
    }

    /// Pick up to `count` distinct channels uniformly at random
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, count: usize) -> Vec<String> {
        self.channels.choose_multiple(rng, count).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

fn is_relevant(channel: &str, lowered_keywords: &[String]) -> bool {
    if lowered_keywords.is_empty() {
        return true;
    }
    let channel = channel.to_lowercase();
    lowered_keywords.iter().any(|keyword| channel.contains(keyword.as_str()))
}
