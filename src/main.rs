//! Community Digest Bot — Binary Entrypoint
//! Loads configuration, wires the pipeline, runs once eagerly, then keeps
//! collecting on a fixed interval.

use std::time::Duration;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use neuro_digest_bot::config;
use neuro_digest_bot::ingest;
use neuro_digest_bot::ledger::PostedLedger;
use neuro_digest_bot::monitor::RunMonitor;
use neuro_digest_bot::notify::telegram::TelegramClient;
use neuro_digest_bot::pipeline::Pipeline;
use neuro_digest_bot::scheduler;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    // Missing channel credentials abort here, before any run begins.
    let cfg = config::load_default()?;

    let client = ingest::http::build_client()?;
    let sources = ingest::build_sources(&cfg.sources, &client);
    let ledger = PostedLedger::new(&cfg.settings.ledger_path);
    let monitor = RunMonitor::open(&cfg.settings.status_path);
    let channel = TelegramClient::new(&cfg.telegram);

    let mut pipeline = Pipeline::new(
        sources,
        ledger,
        monitor,
        Box::new(channel),
        Duration::from_secs(cfg.settings.message_delay_seconds),
    );

    scheduler::run_forever(
        &mut pipeline,
        Duration::from_secs(cfg.settings.run_interval_minutes * 60),
    )
    .await;

    Ok(())
}
