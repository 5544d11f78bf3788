// src/ingest/http.rs
//! Retry-enabled HTTP GET used by every source adapter.
//!
//! Connect errors and 5xx responses are retried with capped exponential
//! backoff; 4xx responses fail immediately.

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use reqwest::{Client, Response};

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_RETRIES: u8 = 3;

pub fn build_client() -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
        .user_agent(concat!("neuro-digest-bot/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .context("building http client")
}

/// GET with a bounded retry budget (`retries` = total attempts).
pub async fn get_with_retry(
    client: &Client,
    url: &str,
    query: Option<&BTreeMap<String, String>>,
    retries: u8,
) -> Result<Response> {
    let mut attempt: u8 = 0;
    loop {
        attempt += 1;
        let mut req = client.get(url);
        if let Some(params) = query {
            req = req.query(params);
        }
        match req.send().await {
            Ok(rsp) => {
                let status = rsp.status();
                if status.is_server_error() && attempt < retries {
                    tracing::debug!(%status, url, attempt, "server error, retrying");
                    backoff(attempt).await;
                    continue;
                }
                if !status.is_success() {
                    return Err(anyhow!("HTTP {status} for {url}"));
                }
                return Ok(rsp);
            }
            Err(e) => {
                if attempt < retries {
                    tracing::debug!(error = ?e, url, attempt, "request error, retrying");
                    backoff(attempt).await;
                    continue;
                }
                return Err(anyhow!("request to {url} failed after {attempt} attempts: {e}"));
            }
        }
    }
}

pub async fn get_text(client: &Client, url: &str, retries: u8) -> Result<String> {
    get_with_retry(client, url, None, retries)
        .await?
        .text()
        .await
        .with_context(|| format!("reading body from {url}"))
}

async fn backoff(attempt: u8) {
    tokio::time::sleep(Duration::from_millis(500u64 << (attempt - 1))).await;
}
