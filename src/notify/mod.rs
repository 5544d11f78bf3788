// src/notify/mod.rs
//! Delivery pipeline: pushes formatted messages through an abstract channel
//! client, honoring rate limits and recording every confirmed send in the
//! posted-URL ledger.

pub mod telegram;

use std::time::Duration;

use async_trait::async_trait;
use metrics::counter;
use tracing::{info, warn};

use crate::ledger::PostedLedger;
use crate::monitor::RunMonitor;

/// Outcome of a single channel send attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    RateLimited { retry_after_secs: u64 },
    Failed(String),
}

/// Abstract message channel. The pipeline never talks to a provider directly.
#[async_trait]
pub trait ChannelClient: Send + Sync {
    async fn send(&self, text: &str) -> SendOutcome;
}

/// Rate-limit retries per message are bounded so a hostile retry_after can
/// never stall a run indefinitely.
pub const MAX_RATE_LIMIT_ATTEMPTS: u8 = 5;

/// Send messages in order with a polite delay between them. A rate-limited
/// message is retried after the provider-suggested wait; any other failure
/// drops that message only. Returns the number of messages actually sent.
pub async fn deliver_all(
    channel: &dyn ChannelClient,
    messages: &[(String, String)],
    ledger: &PostedLedger,
    monitor: &mut RunMonitor,
    delay: Duration,
) -> usize {
    let mut sent = 0usize;

    for (idx, (text, url)) in messages.iter().enumerate() {
        if idx > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut attempt: u8 = 0;
        loop {
            attempt += 1;
            match channel.send(text).await {
                SendOutcome::Sent => {
                    // record immediately so an interrupted run never resends
                    ledger.record(url);
                    counter!("messages_sent_total").increment(1);
                    sent += 1;
                    break;
                }
                SendOutcome::RateLimited { retry_after_secs } => {
                    if attempt >= MAX_RATE_LIMIT_ATTEMPTS {
                        warn!(url = %url, attempts = attempt, "rate limited too often, dropping message");
                        counter!("messages_failed_total").increment(1);
                        monitor.record_error(
                            "delivery",
                            "message dropped after repeated rate limits",
                        );
                        break;
                    }
                    warn!(retry_after_secs, attempt, "channel rate limit hit, waiting");
                    tokio::time::sleep(Duration::from_secs(retry_after_secs + 1)).await;
                }
                SendOutcome::Failed(reason) => {
                    warn!(error = %reason, url = %url, "message send failed, skipping");
                    counter!("messages_failed_total").increment(1);
                    monitor.record_error("delivery", &reason);
                    break;
                }
            }
        }
    }

    info!(sent, total = messages.len(), "delivery finished");
    sent
}
