// tests/pipeline_e2e.rs
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use neuro_digest_bot::ingest::types::{Item, SourceProvider};
use neuro_digest_bot::ingest::ConfiguredSource;
use neuro_digest_bot::ledger::PostedLedger;
use neuro_digest_bot::monitor::RunMonitor;
use neuro_digest_bot::notify::{ChannelClient, SendOutcome};
use neuro_digest_bot::pipeline::Pipeline;

struct FixedProvider {
    name: String,
    items: Vec<Item>,
}

#[async_trait::async_trait]
impl SourceProvider for FixedProvider {
    async fn fetch_items(&self) -> anyhow::Result<Vec<Item>> {
        Ok(self.items.clone())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Channel that records accepted texts and replays a scripted outcome queue
/// (empty queue means every send succeeds).
#[derive(Clone, Default)]
struct RecordingChannel {
    script: Arc<Mutex<VecDeque<SendOutcome>>>,
    sent: Arc<Mutex<Vec<String>>>,
}

#[async_trait::async_trait]
impl ChannelClient for RecordingChannel {
    async fn send(&self, text: &str) -> SendOutcome {
        let outcome = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(SendOutcome::Sent);
        if outcome == SendOutcome::Sent {
            self.sent.lock().unwrap().push(text.to_string());
        }
        outcome
    }
}

fn item(title: &str, url: &str) -> Item {
    Item {
        title: title.to_string(),
        url: url.to_string(),
        category: "news".to_string(),
        ..Default::default()
    }
}

fn two_sources() -> Vec<ConfiguredSource> {
    // URL B appears in both sources with an identical title (= identifier)
    vec![
        ConfiguredSource {
            name: "Alpha".to_string(),
            category: Some("news".to_string()),
            provider: Box::new(FixedProvider {
                name: "Alpha".to_string(),
                items: vec![
                    item("Story A", "https://example.com/a"),
                    item("Story B", "https://example.com/b"),
                ],
            }),
        },
        ConfiguredSource {
            name: "Beta".to_string(),
            category: Some("news".to_string()),
            provider: Box::new(FixedProvider {
                name: "Beta".to_string(),
                items: vec![
                    item("Story B", "https://example.com/b"),
                    item("Story C", "https://example.com/c"),
                ],
            }),
        },
    ]
}

fn pipeline_in(
    dir: &tempfile::TempDir,
    sources: Vec<ConfiguredSource>,
    channel: RecordingChannel,
) -> Pipeline {
    Pipeline::new(
        sources,
        PostedLedger::new(dir.path().join("posted_urls.txt")),
        RunMonitor::open(dir.path().join("status.json")),
        Box::new(channel),
        Duration::ZERO,
    )
}

#[tokio::test]
async fn duplicate_across_sources_posts_three_unique_items() {
    let dir = tempfile::tempdir().unwrap();
    let channel = RecordingChannel::default();
    let mut pipeline = pipeline_in(&dir, two_sources(), channel.clone());

    let outcome = pipeline.run_once().await;
    assert_eq!(outcome.fetched, 4);
    assert_eq!(outcome.unique, 3);
    assert_eq!(outcome.formatted, 3);
    assert_eq!(outcome.sent, 3);
    assert!(outcome.success);

    assert_eq!(channel.sent.lock().unwrap().len(), 3);

    let ledger = PostedLedger::new(dir.path().join("posted_urls.txt"));
    let live = ledger.load();
    for url in [
        "https://example.com/a",
        "https://example.com/b",
        "https://example.com/c",
    ] {
        assert!(live.contains(url), "missing {url}");
    }

    let monitor = RunMonitor::open(dir.path().join("status.json"));
    assert_eq!(monitor.status().total_runs, 1);
    assert_eq!(monitor.status().successful_runs, 1);
    assert_eq!(monitor.status().posts_count, 3);
    assert_eq!(
        monitor.status().sources_status.get("Alpha").map(String::as_str),
        Some("OK (2 items)")
    );
}

#[tokio::test]
async fn immediate_rerun_posts_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let channel = RecordingChannel::default();
    let mut pipeline = pipeline_in(&dir, two_sources(), channel.clone());

    let first = pipeline.run_once().await;
    assert_eq!(first.sent, 3);

    let second = pipeline.run_once().await;
    assert_eq!(second.unique, 3);
    assert_eq!(second.formatted, 0);
    assert_eq!(second.sent, 0);
    assert!(second.success);

    // nothing new reached the channel
    assert_eq!(channel.sent.lock().unwrap().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn rate_limited_message_is_retried_before_moving_on() {
    let dir = tempfile::tempdir().unwrap();
    let channel = RecordingChannel::default();
    channel.script.lock().unwrap().extend([
        SendOutcome::Sent,
        SendOutcome::RateLimited {
            retry_after_secs: 5,
        },
        SendOutcome::Sent,
        SendOutcome::Sent,
    ]);
    let mut pipeline = pipeline_in(&dir, two_sources(), channel.clone());

    let started = tokio::time::Instant::now();
    let outcome = pipeline.run_once().await;

    assert_eq!(outcome.sent, 3);
    assert!(outcome.success);
    assert_eq!(channel.sent.lock().unwrap().len(), 3);
    // slept at least the provider-suggested wait before resending message 2
    assert!(started.elapsed() >= Duration::from_secs(5));
}

#[tokio::test]
async fn failed_source_never_aborts_the_run() {
    struct BrokenProvider;

    #[async_trait::async_trait]
    impl SourceProvider for BrokenProvider {
        async fn fetch_items(&self) -> anyhow::Result<Vec<Item>> {
            anyhow::bail!("connection reset by peer")
        }

        fn name(&self) -> &str {
            "Broken"
        }
    }

    let dir = tempfile::tempdir().unwrap();
    let channel = RecordingChannel::default();
    let sources = vec![
        ConfiguredSource {
            name: "Broken".to_string(),
            category: None,
            provider: Box::new(BrokenProvider),
        },
        ConfiguredSource {
            name: "Alpha".to_string(),
            category: Some("news".to_string()),
            provider: Box::new(FixedProvider {
                name: "Alpha".to_string(),
                items: vec![item("Story A", "https://example.com/a")],
            }),
        },
    ];
    let mut pipeline = pipeline_in(&dir, sources, channel.clone());

    let outcome = pipeline.run_once().await;
    assert_eq!(outcome.sent, 1);
    assert!(outcome.success);

    let status = pipeline.monitor().status();
    assert!(status
        .sources_status
        .get("Broken")
        .is_some_and(|s| s.starts_with("Error:")));
    assert!(status.errors.iter().any(|e| e.source == "Broken"));
}
