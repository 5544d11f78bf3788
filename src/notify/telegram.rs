// src/notify/telegram.rs
//! Telegram Bot API channel client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::json;

use super::{ChannelClient, SendOutcome};
use crate::config::TelegramConfig;

/// Wait applied when Telegram rate-limits without a usable retry_after.
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 30;

pub struct TelegramClient {
    token: String,
    chat_id: String,
    topic_id: Option<i64>,
    client: Client,
    timeout: Duration,
}

impl TelegramClient {
    pub fn new(cfg: &TelegramConfig) -> Self {
        Self {
            token: cfg.token.clone(),
            chat_id: cfg.chat_id.clone(),
            topic_id: cfg.topic_id,
            client: Client::new(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    fn endpoint(&self) -> String {
        format!("https://api.telegram.org/bot{}/sendMessage", self.token)
    }
}

#[async_trait]
impl ChannelClient for TelegramClient {
    async fn send(&self, text: &str) -> SendOutcome {
        let mut body = json!({
            "chat_id": self.chat_id,
            "text": text,
            "parse_mode": "MarkdownV2",
            "disable_web_page_preview": true,
        });
        if let Some(topic) = self.topic_id {
            body["message_thread_id"] = json!(topic);
        }

        let rsp = match self
            .client
            .post(self.endpoint())
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
        {
            Ok(rsp) => rsp,
            Err(e) => return SendOutcome::Failed(format!("telegram request failed: {e}")),
        };

        let status = rsp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = rsp
                .json::<serde_json::Value>()
                .await
                .ok()
                .and_then(|v| v.pointer("/parameters/retry_after").and_then(|n| n.as_u64()))
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            return SendOutcome::RateLimited {
                retry_after_secs: retry_after,
            };
        }
        if !status.is_success() {
            let detail = rsp.text().await.unwrap_or_default();
            return SendOutcome::Failed(format!("telegram api error {status}: {detail}"));
        }

        tracing::debug!("message sent to telegram chat");
        SendOutcome::Sent
    }
}
