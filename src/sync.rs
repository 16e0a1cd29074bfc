use crate::config::StoreConfig;
use crate::error::{DigestError, Result};
use crate::storage::ProcessedRecord;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

/// External table mirroring processed records
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert or update records keyed by video id
    async fn upsert(&self, records: &[ProcessedRecord]) -> Result<()>;
}

#[derive(Debug, Serialize, PartialEq)]
struct ClipRow<'a> {
    id: &'a str,
    title: &'a str,
    channel: &'a str,
    summary: &'a str,
    url: String,
}

impl<'a> From<&'a ProcessedRecord> for ClipRow<'a> {
    fn from(record: &'a ProcessedRecord) -> Self {
        Self {
            id: &record.id,
            title: &record.title,
            channel: &record.channel,
            summary: &record.summary,
            url: record.watch_url(),
        }
    }
}

/// Supabase REST table client
pub struct SupabaseStore {
    client: Client,
    table_url: String,
    anon_key: String,
}

impl SupabaseStore {
    /// Returns None unless both the project URL and key are configured
    pub fn from_config(config: &StoreConfig) -> Option<Self> {
        let url = config.url.as_deref().filter(|u| !u.is_empty())?;
        let anon_key = config.anon_key.clone().filter(|k| !k.is_empty())?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .unwrap_or_else(|_| Client::new());

        let table_url = format!("{}/rest/v1/{}", url.trim_end_matches('/'), config.table);
        info!("🗄️ Store sync enabled: {}", table_url);

        Some(Self {
            client,
            table_url,
            anon_key,
        })
    }
}

#[async_trait]
impl RecordStore for SupabaseStore {
    async fn upsert(&self, records: &[ProcessedRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let rows: Vec<ClipRow<'_>> = records.iter().map(ClipRow::from).collect();

        let response = self
            .client
            .post(&self.table_url)
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
            .header("Prefer", "resolution=merge-duplicates")
            .json(&rows)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DigestError::Store(format!("HTTP {}: {}", status, body)));
        }

        debug!("Synced {} records to {}", rows.len(), self.table_url);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use httpmock::Method::POST;
    use httpmock::MockServer;
    use serde_json::json;

    fn record(id: &str) -> ProcessedRecord {
        ProcessedRecord {
            id: id.to_string(),
            title: "黃金".to_string(),
            channel: "財經台".to_string(),
            published_time_text: "1 day ago".to_string(),
            summary: "- 金價 2400".to_string(),
            processed_at: "10-18 09:05".to_string(),
        }
    }

    fn config_for(url: Option<String>, key: Option<&str>) -> StoreConfig {
        let mut config = Config::default().store;
        config.url = url;
        config.anon_key = key.map(str::to_string);
        config
    }

    #[test]
    fn test_unconfigured_store_is_skipped() {
        assert!(SupabaseStore::from_config(&config_for(None, Some("key"))).is_none());
        assert!(SupabaseStore::from_config(&config_for(Some("https://x.supabase.co".into()), None)).is_none());
    }

    #[tokio::test]
    async fn test_upsert_sends_rows_with_merge_header() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/rest/v1/youtube_clips")
                    .header("apikey", "anon")
                    .header("authorization", "Bearer anon")
                    .header("prefer", "resolution=merge-duplicates")
                    .json_body(json!([{
                        "id": "gold01",
                        "title": "黃金",
                        "channel": "財經台",
                        "summary": "- 金價 2400",
                        "url": "https://www.youtube.com/watch?v=gold01"
                    }]));
                then.status(201);
            })
            .await;

        let store = SupabaseStore::from_config(&config_for(Some(server.base_url()), Some("anon"))).unwrap();
        store.upsert(&[record("gold01")]).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_upsert_failure_is_store_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/rest/v1/youtube_clips");
                then.status(401).body("invalid key");
            })
            .await;

        let store = SupabaseStore::from_config(&config_for(Some(server.base_url()), Some("bad"))).unwrap();
        let result = store.upsert(&[record("x")]).await;
        assert!(matches!(result, Err(DigestError::Store(msg)) if msg.contains("invalid key")));
    }
}
