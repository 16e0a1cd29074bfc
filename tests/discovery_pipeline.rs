use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tube_digest::error::Result as DigestResult;
use tube_digest::llm::summarize::NO_TRANSCRIPT_CAVEAT;
use tube_digest::{
    CandidateVideo, Collaborators, DigestError, Monitor, MonitorOptions, Notifier, PagePublisher, ProcessedRecord,
    RecordHistory, RecordStore, SeenSet, SubscriptionList, Summarize, TranscriptSource, VideoSearch,
};

fn candidate(id: &str, title: &str, channel: &str, time: &str) -> CandidateVideo {
    CandidateVideo {
        id: id.to_string(),
        title: title.to_string(),
        channel: channel.to_string(),
        published_time_text: time.to_string(),
    }
}

/// Returns the same results for a query on every call
struct StaticSearch {
    results: HashMap<String, Vec<CandidateVideo>>,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl VideoSearch for StaticSearch {
    async fn search(&self, query: &str) -> Vec<CandidateVideo> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.results.get(query).cloned().unwrap_or_default()
    }
}

/// Returns brand new uploads from the queried channel on every call
struct FreshSearch {
    per_call: usize,
    next_id: AtomicUsize,
}

#[async_trait]
impl VideoSearch for FreshSearch {
    async fn search(&self, query: &str) -> Vec<CandidateVideo> {
        (0..self.per_call)
            .map(|_| {
                let n = self.next_id.fetch_add(1, Ordering::SeqCst);
                candidate(&format!("fresh{:04}", n), "新片", query, "1 hour ago")
            })
            .collect()
    }
}

struct FakeTranscripts {
    available: bool,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl TranscriptSource for FakeTranscripts {
    async fn fetch(&self, video_id: &str) -> Option<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.available.then(|| format!("transcript of {}", video_id))
    }
}

struct FakeSummarizer {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Summarize for FakeSummarizer {
    async fn summarize(&self, title: &str, transcript: Option<&str>) -> String {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match transcript {
            Some(_) => format!("summary of {}", title),
            None => title.to_string(),
        }
    }
}

struct RecordingNotifier {
    sent: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, record: &ProcessedRecord) -> DigestResult<()> {
        self.sent.lock().unwrap().push(record.id.clone());
        Ok(())
    }
}

struct RecordingStore {
    batches: Arc<Mutex<Vec<Vec<String>>>>,
}

#[async_trait]
impl RecordStore for RecordingStore {
    async fn upsert(&self, records: &[ProcessedRecord]) -> DigestResult<()> {
        self.batches
            .lock()
            .unwrap()
            .push(records.iter().map(|r| r.id.clone()).collect());
        Ok(())
    }
}

/// Fails on its first delivery, then records ids
struct FlakyNotifier {
    attempts: Arc<AtomicUsize>,
    sent: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Notifier for FlakyNotifier {
    async fn notify(&self, record: &ProcessedRecord) -> DigestResult<()> {
        if self.attempts.fetch_add(1, Ordering::SeqCst) == 0 {
            return Err(DigestError::Telegram("502 Bad Gateway".to_string()));
        }
        self.sent.lock().unwrap().push(record.id.clone());
        Ok(())
    }
}

struct FailingStore;

#[async_trait]
impl RecordStore for FailingStore {
    async fn upsert(&self, _records: &[ProcessedRecord]) -> DigestResult<()> {
        Err(DigestError::Store("HTTP 500".to_string()))
    }
}

#[derive(Default, Clone)]
struct Counters {
    searches: Arc<AtomicUsize>,
    transcripts: Arc<AtomicUsize>,
    summaries: Arc<AtomicUsize>,
    notified: Arc<Mutex<Vec<String>>>,
    stored: Arc<Mutex<Vec<Vec<String>>>>,
}

fn collaborators(search: Box<dyn VideoSearch>, transcripts_available: bool, counters: &Counters) -> Collaborators {
    Collaborators {
        search,
        transcripts: Box::new(FakeTranscripts {
            available: transcripts_available,
            calls: counters.transcripts.clone(),
        }),
        summarizer: Box::new(FakeSummarizer {
            calls: counters.summaries.clone(),
        }),
        notifier: Some(Box::new(RecordingNotifier {
            sent: counters.notified.clone(),
        })),
        store: Some(Box::new(RecordingStore {
            batches: counters.stored.clone(),
        })),
        page: None,
        git: None,
    }
}

fn static_search(results: Vec<(&str, Vec<CandidateVideo>)>, counters: &Counters) -> Box<dyn VideoSearch> {
    Box::new(StaticSearch {
        results: results
            .into_iter()
            .map(|(query, videos)| (query.to_string(), videos))
            .collect(),
        calls: counters.searches.clone(),
    })
}

fn monitor(
    dir: &Path,
    subscriptions: &[&str],
    history_limit: usize,
    options: MonitorOptions,
    collaborators: Collaborators,
) -> Monitor {
    Monitor::new(
        options,
        SubscriptionList::new(subscriptions.iter().map(|s| s.to_string()).collect()),
        SeenSet::load(&dir.join("seen_videos.json"), None),
        RecordHistory::load(&dir.join("records.json"), history_limit),
        collaborators,
    )
    .with_seed(7)
}

fn fast_options() -> MonitorOptions {
    MonitorOptions {
        cycle_interval: Duration::from_millis(10),
        ..MonitorOptions::default()
    }
}

#[tokio::test]
async fn test_new_video_is_processed_exactly_once() {
    let temp_dir = TempDir::new().unwrap();
    let counters = Counters::default();
    let search = static_search(
        vec![(
            "Crypto Daily",
            vec![
                candidate("abc123", "BTC 突破新高", "Crypto Daily Official", "2 days ago"),
                candidate("zzz999", "Unrelated", "Cooking Channel", "1 day ago"),
            ],
        )],
        &counters,
    );
    let mut monitor = monitor(
        temp_dir.path(),
        &["Crypto Daily"],
        200,
        fast_options(),
        collaborators(search, true, &counters),
    );

    let first = monitor.run_cycle().await;
    assert_eq!(first.subscriptions_checked, 1);
    assert_eq!(first.candidates_found, 2);
    assert_eq!(first.channel_mismatches, 1);
    assert_eq!(first.accepted, 1);

    let record = monitor.history().iter().next().unwrap().clone();
    assert_eq!(record.id, "abc123");
    assert_eq!(record.channel, "Crypto Daily Official");
    assert_eq!(record.published_time_text, "2 days ago");
    assert_eq!(record.summary, "summary of BTC 突破新高");
    assert!(monitor.seen().contains("abc123"));
    assert_eq!(*counters.notified.lock().unwrap(), vec!["abc123"]);
    assert_eq!(*counters.stored.lock().unwrap(), vec![vec!["abc123"]]);

    let second = monitor.run_cycle().await;
    assert_eq!(second.accepted, 0);
    assert_eq!(second.already_seen, 1);
    assert_eq!(counters.searches.load(Ordering::SeqCst), 2);
    // Filtered before any transcript or summary work
    assert_eq!(counters.transcripts.load(Ordering::SeqCst), 1);
    assert_eq!(counters.summaries.load(Ordering::SeqCst), 1);
    assert_eq!(counters.notified.lock().unwrap().len(), 1);
    assert_eq!(monitor.history().len(), 1);
}

#[tokio::test]
async fn test_state_survives_restart() {
    let temp_dir = TempDir::new().unwrap();
    let results = vec![(
        "Crypto Daily",
        vec![candidate("abc123", "BTC", "Crypto Daily Official", "2 days ago")],
    )];

    let counters = Counters::default();
    let mut first = monitor(
        temp_dir.path(),
        &["Crypto Daily"],
        200,
        fast_options(),
        collaborators(static_search(results.clone(), &counters), true, &counters),
    );
    assert_eq!(first.run_cycle().await.accepted, 1);
    drop(first);

    let restarted_counters = Counters::default();
    let mut restarted = monitor(
        temp_dir.path(),
        &["Crypto Daily"],
        200,
        fast_options(),
        collaborators(static_search(results, &restarted_counters), true, &restarted_counters),
    );
    assert_eq!(restarted.history().len(), 1);

    let report = restarted.run_cycle().await;
    assert_eq!(report.accepted, 0);
    assert_eq!(report.already_seen, 1);
    assert_eq!(restarted_counters.summaries.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_missing_transcript_adds_caveat() {
    let temp_dir = TempDir::new().unwrap();
    let counters = Counters::default();
    let search = static_search(
        vec![("財經台", vec![candidate("gold01", "黃金再創新高", "財經台", "3 hours ago")])],
        &counters,
    );
    let mut monitor = monitor(
        temp_dir.path(),
        &["財經台"],
        200,
        fast_options(),
        collaborators(search, false, &counters),
    );

    monitor.run_cycle().await;

    let record = monitor.history().iter().next().unwrap();
    assert_eq!(record.summary, format!("{}黃金再創新高", NO_TRANSCRIPT_CAVEAT));
}

#[tokio::test]
async fn test_cycle_accepts_at_most_five() {
    let temp_dir = TempDir::new().unwrap();
    let counters = Counters::default();
    let channels = ["Alpha Stock", "Beta Stock", "Gamma Stock"];
    let results = channels
        .iter()
        .map(|channel| {
            let videos = (0..4)
                .map(|i| candidate(&format!("{}-{}", channel, i), "t", channel, "1 day ago"))
                .collect();
            (*channel, videos)
        })
        .collect();
    let search = static_search(results, &counters);
    let mut monitor = monitor(
        temp_dir.path(),
        &channels,
        200,
        fast_options(),
        collaborators(search, true, &counters),
    );

    let accepted: Vec<usize> = {
        let mut counts = Vec::new();
        for _ in 0..3 {
            counts.push(monitor.run_cycle().await.accepted);
        }
        counts
    };

    assert_eq!(accepted, vec![5, 5, 2]);
    assert_eq!(monitor.history().len(), 12);
    assert_eq!(counters.stored.lock().unwrap().iter().map(Vec::len).collect::<Vec<_>>(), vec![5, 5, 2]);
}

#[tokio::test]
async fn test_history_stays_bounded_across_cycles() {
    let temp_dir = TempDir::new().unwrap();
    let counters = Counters::default();
    let search = Box::new(FreshSearch {
        per_call: 3,
        next_id: AtomicUsize::new(0),
    });
    let mut monitor = monitor(
        temp_dir.path(),
        &["Market Watch", "Crypto Talk"],
        10,
        fast_options(),
        collaborators(search, true, &counters),
    );

    for _ in 0..6 {
        monitor.run_cycle().await;
        assert!(monitor.history().len() <= 10);
    }

    assert_eq!(monitor.history().len(), 10);
    assert_eq!(monitor.seen().len(), 30);
    // Every id in history is remembered as seen
    assert!(monitor.history().iter().all(|r| monitor.seen().contains(&r.id)));

    let persisted = RecordHistory::load(&temp_dir.path().join("records.json"), 10);
    assert_eq!(persisted.len(), 10);
    assert_eq!(SeenSet::load(&temp_dir.path().join("seen_videos.json"), None).len(), 30);
}

#[tokio::test]
async fn test_dry_run_skips_outbound_side_effects() {
    let temp_dir = TempDir::new().unwrap();
    let counters = Counters::default();
    let search = static_search(
        vec![("Crypto Daily", vec![candidate("abc123", "BTC", "Crypto Daily", "1 day ago")])],
        &counters,
    );
    let options = MonitorOptions {
        dry_run: true,
        ..fast_options()
    };
    let mut monitor = monitor(
        temp_dir.path(),
        &["Crypto Daily"],
        200,
        options,
        collaborators(search, true, &counters),
    );

    assert_eq!(monitor.run_cycle().await.accepted, 1);
    assert!(counters.notified.lock().unwrap().is_empty());
    assert!(counters.stored.lock().unwrap().is_empty());
    assert!(!temp_dir.path().join("records.json").exists());
    assert!(!temp_dir.path().join("seen_videos.json").exists());

    // Still deduplicated within the same process
    assert_eq!(monitor.run_cycle().await.accepted, 0);
}

#[tokio::test]
async fn test_real_run_after_dry_run_still_delivers() {
    let temp_dir = TempDir::new().unwrap();
    let results = vec![("Crypto Daily", vec![candidate("abc123", "BTC", "Crypto Daily", "1 day ago")])];

    let dry_counters = Counters::default();
    let mut dry = monitor(
        temp_dir.path(),
        &["Crypto Daily"],
        200,
        MonitorOptions {
            dry_run: true,
            ..fast_options()
        },
        collaborators(static_search(results.clone(), &dry_counters), true, &dry_counters),
    );
    assert_eq!(dry.run_cycle().await.accepted, 1);
    drop(dry);

    let counters = Counters::default();
    let mut real = monitor(
        temp_dir.path(),
        &["Crypto Daily"],
        200,
        fast_options(),
        collaborators(static_search(results, &counters), true, &counters),
    );
    let report = real.run_cycle().await;

    assert_eq!(report.already_seen, 0);
    assert_eq!(report.accepted, 1);
    assert_eq!(*counters.notified.lock().unwrap(), vec!["abc123"]);
    assert_eq!(*counters.stored.lock().unwrap(), vec![vec!["abc123"]]);
    assert!(SeenSet::load(&temp_dir.path().join("seen_videos.json"), None).contains("abc123"));
}

#[tokio::test]
async fn test_failed_store_and_notification_do_not_stop_the_cycle() {
    let temp_dir = TempDir::new().unwrap();
    let page_path = temp_dir.path().join("index.html");
    std::fs::write(&page_path, "<script>const videos = [];</script>").unwrap();

    let counters = Counters::default();
    let search = static_search(
        vec![(
            "Crypto Daily",
            vec![
                candidate("first1", "one", "Crypto Daily", "1 day ago"),
                candidate("second", "two", "Crypto Daily", "2 days ago"),
                candidate("third3", "three", "Crypto Daily", "3 days ago"),
            ],
        )],
        &counters,
    );
    let attempts = Arc::new(AtomicUsize::new(0));
    let mut collaborators = collaborators(search, true, &counters);
    collaborators.notifier = Some(Box::new(FlakyNotifier {
        attempts: attempts.clone(),
        sent: counters.notified.clone(),
    }));
    collaborators.store = Some(Box::new(FailingStore));
    collaborators.page = Some(PagePublisher::new(page_path.clone(), 15));

    let mut monitor = monitor(temp_dir.path(), &["Crypto Daily"], 200, fast_options(), collaborators);
    let report = monitor.run_cycle().await;

    assert_eq!(report.accepted, 3);
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    assert_eq!(*counters.notified.lock().unwrap(), vec!["second", "third3"]);

    let html = std::fs::read_to_string(&page_path).unwrap();
    for id in ["first1", "second", "third3"] {
        assert!(html.contains(id), "page is missing {}", id);
    }
    assert_eq!(RecordHistory::load(&temp_dir.path().join("records.json"), 200).len(), 3);
}

#[tokio::test]
async fn test_capped_seen_set_keeps_history_ids() {
    let temp_dir = TempDir::new().unwrap();
    let mut history = RecordHistory::new(temp_dir.path().join("records.json"), 2);
    history.extend([ProcessedRecord {
        id: "old001".to_string(),
        title: "BTC".to_string(),
        channel: "Crypto Daily".to_string(),
        published_time_text: "3 days ago".to_string(),
        summary: "summary".to_string(),
        processed_at: "10-15 08:00".to_string(),
    }]);
    history.persist().unwrap();
    // Files from older deployments carry no meaningful order
    std::fs::write(temp_dir.path().join("seen_videos.json"), r#"["old001","a","b"]"#).unwrap();

    let counters = Counters::default();
    let search = static_search(
        vec![("Crypto Daily", vec![candidate("old001", "BTC", "Crypto Daily", "3 days ago")])],
        &counters,
    );
    let mut monitor = Monitor::new(
        fast_options(),
        SubscriptionList::new(vec!["Crypto Daily".to_string()]),
        SeenSet::load(&temp_dir.path().join("seen_videos.json"), Some(2)),
        RecordHistory::load(&temp_dir.path().join("records.json"), 2),
        collaborators(search, true, &counters),
    );

    assert!(monitor.seen().contains("old001"));
    let report = monitor.run_cycle().await;
    assert_eq!(report.already_seen, 1);
    assert_eq!(report.accepted, 0);
    assert!(counters.notified.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_page_is_published_every_cycle() {
    let temp_dir = TempDir::new().unwrap();
    let page_path = temp_dir.path().join("index.html");
    std::fs::write(&page_path, "<script>const videos = [];</script>").unwrap();

    let counters = Counters::default();
    let search = static_search(
        vec![("Crypto Daily", vec![candidate("abc123", "BTC", "Crypto Daily Official", "2 days ago")])],
        &counters,
    );
    let mut collaborators = collaborators(search, true, &counters);
    collaborators.page = Some(PagePublisher::new(page_path.clone(), 15));

    let mut monitor = monitor(temp_dir.path(), &["Crypto Daily"], 200, fast_options(), collaborators);
    monitor.run_cycle().await;

    let html = std::fs::read_to_string(&page_path).unwrap();
    assert!(html.contains("https://www.youtube.com/watch?v=abc123"));
    assert!(html.contains("📌 主題：BTC"));

    // A quiet cycle still rewrites the page from history
    std::fs::write(&page_path, "<script>const videos = [];</script>").unwrap();
    assert_eq!(monitor.run_cycle().await.accepted, 0);
    let html = std::fs::read_to_string(&page_path).unwrap();
    assert!(html.contains("abc123"));
}

#[tokio::test]
async fn test_no_subscriptions_is_quiet() {
    let temp_dir = TempDir::new().unwrap();
    let counters = Counters::default();
    let search = static_search(Vec::new(), &counters);
    let mut monitor = monitor(temp_dir.path(), &[], 200, fast_options(), collaborators(search, true, &counters));

    let report = monitor.run_cycle().await;
    assert_eq!(report, Default::default());
    assert_eq!(counters.searches.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_shutdown_stops_after_current_cycle() {
    let temp_dir = TempDir::new().unwrap();
    let counters = Counters::default();
    let search = static_search(Vec::new(), &counters);
    let mut monitor = monitor(
        temp_dir.path(),
        &["Crypto Daily"],
        200,
        fast_options(),
        collaborators(search, true, &counters),
    );

    monitor.run_until(std::future::ready(())).await;
    assert_eq!(counters.searches.load(Ordering::SeqCst), 1);
}
