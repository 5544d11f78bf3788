// src/scheduler.rs
//! Interval loop driving the pipeline.
//!
//! Each run is awaited in-line, so two runs can never execute concurrently
//! against the same ledger/status storage; a run that overshoots its slot
//! simply delays the next tick.

use std::time::Duration;

use tokio::time::MissedTickBehavior;

use crate::pipeline::Pipeline;

pub async fn run_forever(pipeline: &mut Pipeline, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tracing::info!(interval_secs = interval.as_secs(), "scheduler started");

    loop {
        // the first tick fires immediately: one eager run at process start
        ticker.tick().await;
        pipeline.run_once().await;
        let health = pipeline.monitor().health(interval.as_secs());
        tracing::info!(%health, "run complete");
    }
}
