use crate::config::Config;
use crate::discovery::{channel_matches, CandidateVideo, VideoSearch};
use crate::llm::summarize::{with_caveat, Summarize};
use crate::notify::Notifier;
use crate::publish::{commit_message, GitPublisher, PagePublisher};
use crate::storage::{ProcessedRecord, RecordHistory, SeenSet};
use crate::subscriptions::SubscriptionList;
use crate::sync::RecordStore;
use crate::transcript::TranscriptSource;
use chrono::Local;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Per-cycle limits and behaviour
#[derive(Debug, Clone)]
pub struct MonitorOptions {
    pub sample_size: usize,
    pub max_new_per_cycle: usize,
    pub cycle_interval: Duration,
    /// Search and summarize in memory only: no state files, notifications, store sync or git
    pub dry_run: bool,
}

impl MonitorOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            sample_size: config.discovery.sample_size,
            max_new_per_cycle: config.discovery.max_new_per_cycle,
            cycle_interval: Duration::from_secs(config.discovery.cycle_interval_secs),
            dry_run: false,
        }
    }
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// External services used by the monitor
pub struct Collaborators {
    pub search: Box<dyn VideoSearch>,
    pub transcripts: Box<dyn TranscriptSource>,
    pub summarizer: Box<dyn Summarize>,
    pub notifier: Option<Box<dyn Notifier>>,
    pub store: Option<Box<dyn RecordStore>>,
    pub page: Option<PagePublisher>,
    pub git: Option<GitPublisher>,
}

/// What a single cycle did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub subscriptions_checked: usize,
    pub candidates_found: usize,
    pub channel_mismatches: usize,
    pub already_seen: usize,
    pub accepted: usize,
}

/// Periodic discovery loop over a fixed subscription list
pub struct Monitor {
    options: MonitorOptions,
    subscriptions: SubscriptionList,
    seen: SeenSet,
    history: RecordHistory,
    collaborators: Collaborators,
    rng: StdRng,
}

impl Monitor {
    pub fn new(
        options: MonitorOptions,
        subscriptions: SubscriptionList,
        mut seen: SeenSet,
        history: RecordHistory,
        collaborators: Collaborators,
    ) -> Self {
        // Every id in history must survive the seen-set cap
        seen.refresh(history.iter().map(|record| record.id.as_str()));

        Self {
            options,
            subscriptions,
            seen,
            history,
            collaborators,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Use a deterministic sampler
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn seen(&self) -> &SeenSet {
        &self.seen
    }

    pub fn history(&self) -> &RecordHistory {
        &self.history
    }

    /// Run one discovery cycle: search, accept, commit, publish
    pub async fn run_cycle(&mut self) -> CycleReport {
        let start_time = Instant::now();
        let mut report = CycleReport::default();
        let mut batch = Vec::new();

        if self.subscriptions.is_empty() {
            warn!("No subscriptions loaded, nothing to check");
        }

        let sampled = self.subscriptions.sample(&mut self.rng, self.options.sample_size);
        if !sampled.is_empty() {
            info!(
                "🔍 Checking {} channels in this cycle: {:?}...",
                sampled.len(),
                &sampled[..sampled.len().min(5)]
            );
        }

        'subscriptions: for subscription in &sampled {
            report.subscriptions_checked += 1;

            let results = self.collaborators.search.search(subscription).await;
            report.candidates_found += results.len();

            for candidate in results {
                if !channel_matches(subscription, &candidate.channel) {
                    debug!("Skipping {} from unrelated channel {}", candidate.id, candidate.channel);
                    report.channel_mismatches += 1;
                    continue;
                }

                if self.seen.contains(&candidate.id) {
                    report.already_seen += 1;
                    continue;
                }

                let record = self.accept(candidate).await;
                batch.push(record);

                if batch.len() >= self.options.max_new_per_cycle {
                    info!("Reached {} new videos, ending search early", batch.len());
                    break 'subscriptions;
                }
            }
        }

        report.accepted = batch.len();
        if !batch.is_empty() {
            self.commit(batch).await;
        }
        self.publish().await;

        info!(
            "✅ Cycle finished in {:.1}s: {} channels, {} candidates, {} new",
            start_time.elapsed().as_secs_f64(),
            report.subscriptions_checked,
            report.candidates_found,
            report.accepted
        );
        report
    }

    async fn accept(&mut self, candidate: CandidateVideo) -> ProcessedRecord {
        info!("🆕 Found new video from {}: {}", candidate.channel, candidate.title);

        let transcript = self.collaborators.transcripts.fetch(&candidate.id).await;
        let summary = self
            .collaborators
            .summarizer
            .summarize(&candidate.title, transcript.as_deref())
            .await;
        let summary = match transcript {
            Some(_) => summary,
            None => with_caveat(&summary),
        };

        self.seen.add(candidate.id.clone());
        ProcessedRecord::new(candidate, summary, Local::now())
    }

    async fn commit(&mut self, batch: Vec<ProcessedRecord>) {
        self.history.extend(batch.iter().cloned());
        info!("📝 Recorded {} new videos ({} in history)", batch.len(), self.history.len());

        // State files stay untouched so a later real run still delivers these videos
        if self.options.dry_run {
            info!("Dry run: skipping state files, store sync and notifications");
            return;
        }

        if let Err(e) = self.history.persist() {
            error!("Error saving records to {}: {}", self.history.path().display(), e);
        }
        if let Err(e) = self.seen.persist() {
            error!("Error saving seen ids to {}: {}", self.seen.path().display(), e);
        }

        if let Some(store) = &self.collaborators.store {
            if let Err(e) = store.upsert(&batch).await {
                error!("Store sync failed: {}", e);
            }
        }

        if let Some(notifier) = &self.collaborators.notifier {
            for record in &batch {
                if let Err(e) = notifier.notify(record).await {
                    error!("Failed to notify about {}: {}", record.id, e);
                }
            }
        }
    }

    async fn publish(&self) {
        if let Some(page) = &self.collaborators.page {
            if let Err(e) = page.update(&self.history) {
                error!("Error updating page: {}", e);
            }
        }

        if self.options.dry_run {
            return;
        }

        if let Some(git) = &self.collaborators.git {
            if let Err(e) = git.publish(&commit_message(&Local::now())).await {
                warn!("Git push failed: {}", e);
            }
        }
    }

    /// Run cycles until `shutdown` completes; checked while sleeping between cycles
    pub async fn run_until<F: Future<Output = ()>>(&mut self, shutdown: F) {
        tokio::pin!(shutdown);

        loop {
            self.run_cycle().await;

            info!("💤 Sleeping {}s until next cycle", self.options.cycle_interval.as_secs());
            tokio::select! {
                _ = tokio::time::sleep(self.options.cycle_interval) => {}
                _ = &mut shutdown => {
                    info!("🛑 Shutdown requested, stopping monitor");
                    break;
                }
            }
        }
    }

    /// Run until Ctrl-C
    pub async fn run(&mut self) {
        info!("🚀 Subscription monitor started with {} subscriptions", self.subscriptions.len());
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await;
    }
}
