// src/config.rs
//! Configuration loading and validation.
//!
//! The bot reads a single TOML file describing the Telegram channel, global
//! settings, and the list of content sources. A broken channel section is
//! fatal at startup; everything else degrades at run time.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const ENV_CONFIG_PATH: &str = "BOT_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/sources.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    pub token: String,
    pub chat_id: String,
    /// message_thread_id for group topics
    #[serde(default)]
    pub topic_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub run_interval_minutes: u64,
    pub message_delay_seconds: u64,
    pub log_retention_days: u64,
    pub ledger_path: String,
    pub status_path: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            run_interval_minutes: 30,
            message_delay_seconds: 3,
            log_retention_days: 30,
            ledger_path: "posted_urls.txt".to_string(),
            status_path: "status.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Website,
    Api,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SourceKind,
    pub url: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
    /// API query parameters (credentials included).
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

fn default_max_pages() -> u32 {
    3
}

/// Load config using env var + fallback:
/// 1) $BOT_CONFIG_PATH
/// 2) config/sources.toml
pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var(ENV_CONFIG_PATH)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
    load_from(&path)
}

pub fn load_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading config from {}", path.display()))?;
    let cfg: AppConfig = toml::from_str(&content)
        .with_context(|| format!("parsing config from {}", path.display()))?;
    validate(&cfg)?;
    Ok(cfg)
}

fn validate(cfg: &AppConfig) -> Result<()> {
    if cfg.telegram.token.trim().is_empty() {
        bail!("telegram.token must be set");
    }
    if cfg.telegram.chat_id.trim().is_empty() {
        bail!("telegram.chat_id must be set");
    }
    if cfg.sources.is_empty() {
        tracing::warn!("no sources configured");
    }
    tracing::info!(sources = cfg.sources.len(), "config validated");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [telegram]
        token = "123:abc"
        chat_id = "-100200300"
        topic_id = 42

        [settings]
        run_interval_minutes = 15

        [[sources]]
        name = "Example News"
        type = "website"
        url = "https://example.com/neuroscience/"
        category = "news"
        max_pages = 2

        [[sources]]
        name = "Jobs API"
        type = "api"
        url = "https://api.example.org/v1/jobs"
        category = "jobs"
        [sources.params]
        api_key = "YOUR_API_KEY"
    "#;

    #[test]
    fn sample_config_parses_with_defaults() {
        let cfg: AppConfig = toml::from_str(SAMPLE).unwrap();
        assert_eq!(cfg.telegram.topic_id, Some(42));
        assert_eq!(cfg.settings.run_interval_minutes, 15);
        // untouched settings keep their defaults
        assert_eq!(cfg.settings.message_delay_seconds, 3);
        assert_eq!(cfg.sources.len(), 2);
        assert_eq!(cfg.sources[0].kind, SourceKind::Website);
        assert_eq!(cfg.sources[0].max_pages, 2);
        assert_eq!(cfg.sources[1].kind, SourceKind::Api);
        assert_eq!(cfg.sources[1].max_pages, 3);
        assert_eq!(
            cfg.sources[1].params.get("api_key").map(String::as_str),
            Some("YOUR_API_KEY")
        );
    }

    #[test]
    fn empty_token_is_fatal() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [telegram]
            token = ""
            chat_id = "1"
        "#,
        )
        .unwrap();
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn unknown_source_kind_is_rejected() {
        let res: std::result::Result<AppConfig, _> = toml::from_str(
            r#"
            [telegram]
            token = "t"
            chat_id = "1"

            [[sources]]
            name = "X"
            type = "rss"
            url = "https://example.com"
        "#,
        );
        assert!(res.is_err());
    }
}
