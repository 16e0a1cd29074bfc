/// YouTube search results scraper
use super::extract::Node;
use super::recency::is_recent;
use super::CandidateVideo;
use crate::config::DiscoveryConfig;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use serde_json::Value;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36";

/// `sp` filter for "uploaded this week, videos only"
pub const RECENT_VIDEOS_FILTER: &str = "EgQIBBAB";

pub const NO_TITLE: &str = "No Title";
pub const NO_CHANNEL: &str = "No Channel";

const RESULT_SECTIONS_PATH: &[&str] = &[
    "contents",
    "twoColumnSearchResultsRenderer",
    "primaryContents",
    "sectionListRenderer",
    "contents",
];

static INITIAL_DATA_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:var\s+ytInitialData|window\[["']ytInitialData["']\])\s*=\s*"#)
        .expect("initial data pattern is valid")
});

/// Searches for recent uploads matching a query
#[async_trait]
pub trait VideoSearch: Send + Sync {
    /// Recent candidates for the query; empty when anything goes wrong
    async fn search(&self, query: &str) -> Vec<CandidateVideo>;
}

/// Scrapes the public search results page
#[derive(Clone)]
pub struct YouTubeSearcher {
    client: Client,
    endpoint: String,
    filter: String,
}

impl YouTubeSearcher {
    /// Create a new searcher instance
    pub fn new(config: &DiscoveryConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .user_agent(config.user_agent.as_str())
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            endpoint: config.search_endpoint.clone(),
            filter: config.search_filter.clone(),
        }
    }

    /// Fetch the raw results page for a query
    pub async fn fetch_page(&self, query: &str) -> Result<String> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("search_query", query), ("sp", self.filter.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!("Search returned HTTP {}", response.status()));
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl VideoSearch for YouTubeSearcher {
    async fn search(&self, query: &str) -> Vec<CandidateVideo> {
        match self.fetch_page(query).await {
            Ok(body) => parse_search_page(&body, query),
            Err(e) => {
                warn!("Error searching YouTube for '{}': {}", query, e);
                Vec::new()
            }
        }
    }
}

/// Parse a search results page into recent candidates.
///
/// Returns an empty list when the embedded data block is missing or has an
/// unexpected shape. Renderers without a video id are skipped; missing titles,
/// channels and times fall back to placeholders.
pub fn parse_search_page(body: &str, query: &str) -> Vec<CandidateVideo> {
    let Some(data) = extract_initial_data(body) else {
        warn!("Could not find ytInitialData for keyword: {}", query);
        return Vec::new();
    };

    let sections = Node::new(&data).path(RESULT_SECTIONS_PATH);
    if !sections.is_array() {
        warn!("Unexpected JSON structure for keyword: {}", query);
        return Vec::new();
    }

    let mut videos = Vec::new();
    let mut stale = 0;

    for section in sections.items() {
        for item in section.key("itemSectionRenderer").key("contents").items() {
            let renderer = item.key("videoRenderer");
            if !renderer.exists() {
                continue;
            }

            let Some(candidate) = candidate_from_renderer(renderer) else {
                debug!("Skipping video renderer without id for '{}'", query);
                continue;
            };

            if is_recent(&candidate.published_time_text) {
                videos.push(candidate);
            } else {
                stale += 1;
            }
        }
    }

    debug!("'{}': {} recent results, {} stale", query, videos.len(), stale);
    videos
}

fn candidate_from_renderer(renderer: Node<'_>) -> Option<CandidateVideo> {
    let id = renderer.key("videoId").as_str().filter(|id| !id.is_empty())?;

    let title = renderer.key("title").text().unwrap_or(NO_TITLE);
    let channel = renderer
        .key("longBylineText")
        .text()
        .or_else(|| renderer.key("ownerText").text())
        .unwrap_or(NO_CHANNEL);
    let time = renderer.key("publishedTimeText").text().unwrap_or("");

    Some(CandidateVideo {
        id: id.to_string(),
        title: title.to_string(),
        channel: channel.to_string(),
        published_time_text: time.to_string(),
    })
}

/// Locate and parse the `ytInitialData` object, preferring inline scripts
fn extract_initial_data(body: &str) -> Option<Value> {
    let document = Html::parse_document(body);
    if let Ok(selector) = Selector::parse("script") {
        for script in document.select(&selector) {
            let text: String = script.text().collect();
            if let Some(data) = parse_after_marker(&text) {
                return Some(data);
            }
        }
    }

    parse_after_marker(body)
}

/// Parse the first JSON object following an assignment marker.
///
/// Reads exactly one value, so the trailing `;` and any script after it are ignored.
fn parse_after_marker(text: &str) -> Option<Value> {
    for marker in INITIAL_DATA_MARKER.find_iter(text) {
        let rest = &text[marker.end()..];
        let mut stream = serde_json::Deserializer::from_str(rest).into_iter::<Value>();
        match stream.next() {
            Some(Ok(value)) if value.is_object() => return Some(value),
            Some(Err(e)) => debug!("ytInitialData block is not valid JSON: {}", e),
            _ => {}
        }
    }
    None
}
