use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::llm::{LLMConfig, LLMProvider};
use crate::subscriptions::DEFAULT_RELEVANCE_KEYWORDS;

/// Configuration for the subscription monitor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Search, sampling and cycle settings
    pub discovery: DiscoveryConfig,

    /// Persisted file locations and retention
    pub storage: StorageConfig,

    /// Summarization settings
    pub llm: LLMConfig,

    /// Telegram notification settings
    pub telegram: TelegramConfig,

    /// External record store (Supabase) settings
    pub store: StoreConfig,

    /// Static page and git publishing settings
    pub publish: PublishConfig,

    /// Log output settings
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Subscriptions checked per cycle
    pub sample_size: usize,

    /// Accepted videos per cycle before the cycle stops searching
    pub max_new_per_cycle: usize,

    /// Pause between cycles (seconds)
    pub cycle_interval_secs: u64,

    /// Search results endpoint
    pub search_endpoint: String,

    /// Search filter parameter (`sp`), defaults to "uploaded this week, videos only"
    pub search_filter: String,

    /// Browser-like User-Agent sent with search requests
    pub user_agent: String,

    /// HTTP request timeout in seconds
    pub request_timeout_seconds: u64,

    /// Keywords a subscription name must contain to be monitored
    pub relevance_keywords: Vec<String>,

    /// Preferred transcript languages, most preferred first
    pub transcript_languages: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Base directory for all persisted files
    pub base_dir: PathBuf,

    /// Seen video id list (JSON)
    pub seen_file: String,

    /// Processed record history (JSON)
    pub records_file: String,

    /// Subscription list, one channel per line
    pub subscription_file: String,

    /// Records retained in history
    pub history_limit: usize,

    /// Optional cap on remembered ids (None = never forget)
    pub seen_limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: Option<String>,

    /// Resolved from the bot's latest update when unset
    pub chat_id: Option<String>,

    pub api_base: String,

    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Supabase project URL
    pub url: Option<String>,

    pub anon_key: Option<String>,

    pub table: String,

    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
    /// Page carrying the `const videos = [...]` payload, relative to the base directory
    pub page_file: String,

    /// Records shown on the page
    pub recent_count: usize,

    /// Commit and push the working tree after each cycle
    pub enable_git: bool,

    /// Repository to publish from (defaults to the base directory)
    pub repo_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level for this crate
    pub level: String,

    /// Optional log file, written alongside stdout
    pub log_file: Option<PathBuf>,
}

impl StorageConfig {
    pub fn seen_path(&self) -> PathBuf {
        self.base_dir.join(&self.seen_file)
    }

    pub fn records_path(&self) -> PathBuf {
        self.base_dir.join(&self.records_file)
    }

    pub fn subscription_path(&self) -> PathBuf {
        self.base_dir.join(&self.subscription_file)
    }
}

impl Config {
    /// Load configuration from the first config file found
    pub fn load() -> Result<Self> {
        let config_paths = [
            "tube-digest.toml",
            "config/tube-digest.toml",
            "/etc/tube-digest/config.toml",
        ];

        for path in &config_paths {
            if Path::new(path).exists() {
                match Self::load_from(Path::new(path)) {
                    Ok(config) => return Ok(config),
                    Err(e) => tracing::warn!("Failed to parse config file {}: {}", path, e),
                }
            }
        }

        Err(anyhow!("No configuration file found"))
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("Cannot read config {}: {}", path.display(), e))?;
        let config: Config = toml::from_str(&config_str)?;
        tracing::info!("📄 Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Overlay secrets and deployment values from the environment (and `.env`)
    pub fn apply_env(&mut self) {
        dotenvy::dotenv().ok();

        if let Ok(key) = std::env::var("DEEPSEEK_API_KEY") {
            self.llm.api_key = Some(key);
        }

        if let Ok(key) = std::env::var("LLM_API_KEY") {
            self.llm.api_key = Some(key);
        }

        if let Ok(token) = std::env::var("TELEGRAM_BOT_TOKEN") {
            self.telegram.bot_token = Some(token);
        }

        if let Ok(chat_id) = std::env::var("TELEGRAM_CHAT_ID") {
            self.telegram.chat_id = Some(chat_id);
        }

        if let Ok(url) = std::env::var("SUPABASE_URL") {
            self.store.url = Some(url);
        }

        if let Ok(key) = std::env::var("SUPABASE_ANON_KEY") {
            self.store.anon_key = Some(key);
        }

        if let Ok(base_dir) = std::env::var("TUBE_DIGEST_BASE_DIR") {
            self.storage.base_dir = PathBuf::from(base_dir);
        }

        if let Ok(level) = std::env::var("TUBE_DIGEST_LOG_LEVEL") {
            self.logging.level = level;
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let config_str = toml::to_string_pretty(self)?;
        std::fs::write(path, config_str)?;
        tracing::info!("💾 Configuration saved to: {}", path.display());
        Ok(())
    }

    /// Validate configuration; failures here are fatal at startup
    pub fn validate(&self) -> Result<()> {
        if self.llm.provider != LLMProvider::LMStudio
            && self.llm.api_key.as_deref().map_or(true, str::is_empty)
        {
            return Err(anyhow!(
                "API key required for {:?} (set DEEPSEEK_API_KEY or LLM_API_KEY)",
                self.llm.provider
            ));
        }

        if self.discovery.sample_size == 0 {
            return Err(anyhow!("sample_size must be greater than 0"));
        }

        if self.discovery.max_new_per_cycle == 0 {
            return Err(anyhow!("max_new_per_cycle must be greater than 0"));
        }

        if self.storage.history_limit == 0 {
            return Err(anyhow!("history_limit must be greater than 0"));
        }

        if let Some(limit) = self.storage.seen_limit {
            if limit < self.storage.history_limit {
                return Err(anyhow!(
                    "seen_limit ({}) must not be smaller than history_limit ({})",
                    limit,
                    self.storage.history_limit
                ));
            }
        }

        if let Some(store_url) = &self.store.url {
            url::Url::parse(store_url)
                .map_err(|e| anyhow!("Invalid store URL {}: {}", store_url, e))?;
        }

        tracing::info!("✅ Configuration validation passed");
        Ok(())
    }

    /// Get runtime configuration summary
    pub fn summary(&self) -> String {
        format!(
            "Tube Digest Configuration:\n\
            - Base Directory: {}\n\
            - Channels Per Cycle: {}\n\
            - New Videos Per Cycle: {}\n\
            - Cycle Interval: {}s\n\
            - LLM Provider: {:?} ({})\n\
            - Telegram: {}\n\
            - Store Sync: {}\n\
            - Git Publish: {}",
            self.storage.base_dir.display(),
            self.discovery.sample_size,
            self.discovery.max_new_per_cycle,
            self.discovery.cycle_interval_secs,
            self.llm.provider,
            self.llm.model,
            if self.telegram.bot_token.is_some() { "enabled" } else { "disabled" },
            if self.store.url.is_some() && self.store.anon_key.is_some() { "enabled" } else { "disabled" },
            if self.publish.enable_git { "enabled" } else { "disabled" },
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            discovery: DiscoveryConfig {
                sample_size: 50,
                max_new_per_cycle: 5,
                cycle_interval_secs: 300, // 5 minutes
                search_endpoint: "https://www.youtube.com/results".to_string(),
                search_filter: crate::discovery::search::RECENT_VIDEOS_FILTER.to_string(),
                user_agent: crate::discovery::search::DEFAULT_USER_AGENT.to_string(),
                request_timeout_seconds: 10,
                relevance_keywords: DEFAULT_RELEVANCE_KEYWORDS.iter().map(|k| k.to_string()).collect(),
                transcript_languages: vec![
                    "zh-TW".to_string(),
                    "zh-HK".to_string(),
                    "zh-CN".to_string(),
                    "en".to_string(),
                ],
            },
            storage: StorageConfig {
                base_dir: PathBuf::from("."),
                seen_file: "seen_videos.json".to_string(),
                records_file: "records.json".to_string(),
                subscription_file: "訂閱.txt".to_string(),
                history_limit: 200,
                seen_limit: None,
            },
            llm: LLMConfig::default(),
            telegram: TelegramConfig {
                bot_token: None,
                chat_id: None,
                api_base: "https://api.telegram.org".to_string(),
                timeout_seconds: 10,
            },
            store: StoreConfig {
                url: None,
                anon_key: None,
                table: "youtube_clips".to_string(),
                timeout_seconds: 15,
            },
            publish: PublishConfig {
                page_file: "index.html".to_string(),
                recent_count: 15,
                enable_git: true,
                repo_dir: None,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                log_file: None,
            },
        }
    }
}

/// Configuration builder for programmatic config creation
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_base_dir(mut self, dir: PathBuf) -> Self {
        self.config.storage.base_dir = dir;
        self
    }

    pub fn with_sample_size(mut self, sample_size: usize) -> Self {
        self.config.discovery.sample_size = sample_size;
        self
    }

    pub fn with_max_new_per_cycle(mut self, max_new: usize) -> Self {
        self.config.discovery.max_new_per_cycle = max_new;
        self
    }

    pub fn with_cycle_interval(mut self, secs: u64) -> Self {
        self.config.discovery.cycle_interval_secs = secs;
        self
    }

    pub fn with_llm_api_key(mut self, api_key: String) -> Self {
        self.config.llm.api_key = Some(api_key);
        self
    }

    pub fn with_llm_provider(mut self, provider: LLMProvider) -> Self {
        self.config.llm.provider = provider;
        self
    }

    pub fn with_seen_limit(mut self, limit: Option<usize>) -> Self {
        self.config.storage.seen_limit = limit;
        self
    }

    pub fn enable_git(mut self, enable: bool) -> Self {
        self.config.publish.enable_git = enable;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
