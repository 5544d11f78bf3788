// src/ingest/providers/json_api.rs
//! Generic JSON API adapter.
//!
//! Unwraps common list envelopes and maps flexible field-name aliases onto
//! the [`Item`] shape. Sources carrying placeholder credentials are skipped
//! before any request is made.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;

use crate::config::SourceConfig;
use crate::ingest::http;
use crate::ingest::types::{Item, SourceProvider};

const CREDENTIAL_KEYS: [&str; 5] = ["key", "token", "api_key", "apikey", "access_token"];
const PLACEHOLDER_PREFIX: &str = "YOUR_";
const ENVELOPE_KEYS: [&str; 3] = ["data", "items", "results"];

pub struct JsonApiProvider {
    name: String,
    url: String,
    params: BTreeMap<String, String>,
    client: reqwest::Client,
}

impl JsonApiProvider {
    pub fn new(cfg: &SourceConfig, client: reqwest::Client) -> Self {
        Self {
            name: cfg.name.clone(),
            url: cfg.url.clone(),
            params: cfg.params.clone(),
            client,
        }
    }
}

#[async_trait]
impl SourceProvider for JsonApiProvider {
    async fn fetch_items(&self) -> Result<Vec<Item>> {
        if !has_valid_credentials(&self.params) {
            tracing::warn!(
                source = %self.name,
                "skipping api source: missing or placeholder credentials"
            );
            return Ok(Vec::new());
        }

        let rsp = http::get_with_retry(
            &self.client,
            &self.url,
            Some(&self.params),
            http::DEFAULT_RETRIES,
        )
        .await?;
        let payload: Value = rsp.json().await.context("decoding api json")?;

        let elements = unwrap_envelope(&payload);
        if elements.is_empty() {
            tracing::info!(source = %self.name, "no items in api response");
        }
        let items: Vec<Item> = elements.iter().filter_map(normalize_element).collect();
        tracing::info!(source = %self.name, count = items.len(), "normalized api items");
        Ok(items)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Credential-like params must be present and real before a request goes out.
pub fn has_valid_credentials(params: &BTreeMap<String, String>) -> bool {
    params.iter().all(|(key, value)| {
        if !CREDENTIAL_KEYS.contains(&key.as_str()) {
            return true;
        }
        let v = value.trim();
        !(v.is_empty() || v.starts_with(PLACEHOLDER_PREFIX) || v == "PLACEHOLDER")
    })
}

/// Try known container keys in order; a bare array is used as-is.
pub fn unwrap_envelope(payload: &Value) -> Vec<Value> {
    for key in ENVELOPE_KEYS {
        if let Some(list) = payload.get(key).and_then(Value::as_array) {
            return list.clone();
        }
    }
    payload.as_array().cloned().unwrap_or_default()
}

/// Map one raw element onto the Item shape; elements missing a title or a
/// resolvable url are dropped here with a skip reason.
pub fn normalize_element(obj: &Value) -> Option<Item> {
    let Some(title) = str_alias(obj, &["title", "name"]) else {
        tracing::debug!("api element skipped: no title");
        return None;
    };
    let Some(url) = str_alias(obj, &["url", "link", "permalink"]) else {
        tracing::debug!(title = %title, "api element skipped: no url");
        return None;
    };

    Some(Item {
        title,
        url,
        id: element_id(obj),
        description: str_alias(obj, &["description", "desc", "summary", "content", "excerpt"]),
        date: str_alias(obj, &["date", "published_date", "created_at"]),
        author: str_alias(obj, &["author", "creator"]),
        ..Default::default()
    })
}

fn str_alias(obj: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| obj.get(*key).and_then(Value::as_str))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn element_id(obj: &Value) -> Option<String> {
    match obj.get("id") {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}
