// src/pipeline.rs
//! One full collection run: fetch → dedupe → categorize → format → deliver.
//!
//! Dependencies are constructed once and injected; there is no process-wide
//! mutable state. No stage error escapes a run — the run always completes
//! and records its outcome in the monitor.

use std::time::Duration;

use metrics::{counter, gauge};
use tracing::info;

use crate::categorize;
use crate::format;
use crate::ingest::{self, ConfiguredSource};
use crate::ledger::PostedLedger;
use crate::monitor::RunMonitor;
use crate::notify::{self, ChannelClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    pub fetched: usize,
    pub unique: usize,
    pub formatted: usize,
    pub sent: usize,
    pub success: bool,
}

pub struct Pipeline {
    sources: Vec<ConfiguredSource>,
    ledger: PostedLedger,
    monitor: RunMonitor,
    channel: Box<dyn ChannelClient>,
    message_delay: Duration,
}

impl Pipeline {
    pub fn new(
        sources: Vec<ConfiguredSource>,
        ledger: PostedLedger,
        monitor: RunMonitor,
        channel: Box<dyn ChannelClient>,
        message_delay: Duration,
    ) -> Self {
        Self {
            sources,
            ledger,
            monitor,
            channel,
            message_delay,
        }
    }

    pub fn monitor(&self) -> &RunMonitor {
        &self.monitor
    }

    /// Execute a single collection run. Success means every formatted message
    /// was actually accepted by the channel.
    pub async fn run_once(&mut self) -> RunOutcome {
        ingest::ensure_metrics_described();
        counter!("runs_total").increment(1);

        let run_id = self.monitor.record_run_start();
        info!(run_id, "starting collection run");

        let (raw, source_statuses) = ingest::fetch_all(&self.sources, &mut self.monitor).await;
        let fetched = raw.len();

        let (unique_items, dup_removed, irrelevant_removed) = ingest::dedup_and_filter(raw);
        let unique = unique_items.len();
        counter!("dedup_removed_total").increment(dup_removed as u64);
        counter!("relevance_removed_total").increment(irrelevant_removed as u64);

        let categorized = categorize::categorize(unique_items);

        let posted = self.ledger.load();
        let messages = format::format_messages(&categorized, &posted);
        let formatted = messages.len();

        let sent = notify::deliver_all(
            self.channel.as_ref(),
            &messages,
            &self.ledger,
            &mut self.monitor,
            self.message_delay,
        )
        .await;

        let success = sent == formatted;
        self.monitor
            .record_run_complete(success, sent as u64, source_statuses);
        gauge!("pipeline_last_run_ts").set(chrono::Utc::now().timestamp().max(0) as f64);

        info!(
            run_id,
            fetched,
            unique,
            dup_removed,
            irrelevant_removed,
            formatted,
            sent,
            success,
            "collection run finished"
        );

        RunOutcome {
            fetched,
            unique,
            formatted,
            sent,
            success,
        }
    }
}
