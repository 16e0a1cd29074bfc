use anyhow::Result;
use clap::{Arg, Command};
use std::path::PathBuf;
use tracing::{error, info, warn};

use tube_digest::config::Config;
use tube_digest::logging::init_logging;
use tube_digest::monitor::{Collaborators, Monitor, MonitorOptions};
use tube_digest::notify::{Notifier, TelegramNotifier};
use tube_digest::publish::{GitPublisher, PagePublisher};
use tube_digest::storage::{RecordHistory, SeenSet};
use tube_digest::subscriptions::SubscriptionList;
use tube_digest::sync::{RecordStore, SupabaseStore};
use tube_digest::{VideoSummarizer, YouTubeSearcher, YouTubeTranscripts};

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("Tube Digest")
        .version("0.1.0")
        .author("TigreRoll")
        .about("Watches subscribed YouTube channels and publishes AI summaries of new uploads")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file (defaults to the standard search paths)")
        )
        .arg(
            Arg::new("base-dir")
                .short('d')
                .long("base-dir")
                .value_name("DIR")
                .help("Directory holding the subscription list, state files and page")
        )
        .arg(
            Arg::new("once")
                .long("once")
                .help("Run a single cycle and exit")
                .action(clap::ArgAction::SetTrue)
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .help("Search and summarize without notifying, syncing or pushing")
                .action(clap::ArgAction::SetTrue)
        )
        .arg(
            Arg::new("reset-page")
                .long("reset-page")
                .help("Empty the page's video list and exit")
                .action(clap::ArgAction::SetTrue)
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(clap::ArgAction::SetTrue)
        )
        .get_matches();

    let verbose = matches.get_flag("verbose");
    let dry_run = matches.get_flag("dry-run");

    // Load configuration; a missing file means defaults
    let (mut config, load_error) = match matches.get_one::<String>("config") {
        Some(path) => (Config::load_from(&PathBuf::from(path))?, None),
        None => match Config::load() {
            Ok(config) => (config, None),
            Err(e) => (Config::default(), Some(e)),
        },
    };
    config.apply_env();

    if let Some(base_dir) = matches.get_one::<String>("base-dir") {
        config.storage.base_dir = PathBuf::from(base_dir);
    }

    init_logging(&config.logging, verbose)?;

    if let Some(e) = load_error {
        warn!("Failed to load config, using defaults: {}", e);
    }
    if verbose {
        info!("Verbose logging enabled");
    }

    let page_path = config.storage.base_dir.join(&config.publish.page_file);

    if matches.get_flag("reset-page") {
        PagePublisher::new(page_path.clone(), config.publish.recent_count).clear()?;
        info!("🧹 Cleared video list in {}", page_path.display());
        return Ok(());
    }

    if let Err(e) = config.validate() {
        error!("{}", e);
        return Err(e);
    }

    info!("🚀 Tube Digest starting...");
    info!("{}", config.summary());
    if dry_run {
        info!("🧪 Dry run: state files, notifications, store sync and git push are disabled");
    }

    let subscriptions = SubscriptionList::load(
        &config.storage.subscription_path(),
        &config.discovery.relevance_keywords,
    )
    .await;
    let seen = SeenSet::load(&config.storage.seen_path(), config.storage.seen_limit);
    let history = RecordHistory::load(&config.storage.records_path(), config.storage.history_limit);

    let notifier = if dry_run {
        None
    } else {
        TelegramNotifier::connect(&config.telegram)
            .await
            .map(|n| Box::new(n) as Box<dyn Notifier>)
    };
    let store = SupabaseStore::from_config(&config.store).map(|s| Box::new(s) as Box<dyn RecordStore>);
    let git = config.publish.enable_git.then(|| {
        GitPublisher::new(
            config
                .publish
                .repo_dir
                .clone()
                .unwrap_or_else(|| config.storage.base_dir.clone()),
        )
    });

    let collaborators = Collaborators {
        search: Box::new(YouTubeSearcher::new(&config.discovery)),
        transcripts: Box::new(YouTubeTranscripts::new(config.discovery.transcript_languages.clone())?),
        summarizer: Box::new(VideoSummarizer::new(&config.llm).await?),
        notifier,
        store,
        page: Some(PagePublisher::new(page_path, config.publish.recent_count)),
        git,
    };

    let mut options = MonitorOptions::from_config(&config);
    options.dry_run = dry_run;

    let mut monitor = Monitor::new(options, subscriptions, seen, history, collaborators);

    if matches.get_flag("once") {
        let report = monitor.run_cycle().await;
        info!("🎉 Single cycle complete: {} new videos", report.accepted);
    } else {
        monitor.run().await;
    }

    Ok(())
}
