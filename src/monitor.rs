// src/monitor.rs
//! Per-run status tracking, durable health state, and the status report.
//!
//! The status document is fully rewritten (temp-then-rename) after every
//! mutation, so a crash mid-run loses at most the in-flight run's error
//! detail. Load failures start from a fresh document — status is telemetry,
//! never a reason to abort.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::error;

pub const MAX_STORED_ERRORS: usize = 50;
pub const REPORT_ERROR_LIMIT: usize = 5;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStatus {
    pub last_run: Option<String>,
    pub last_run_formatted: Option<String>,
    pub last_run_timestamp: Option<u64>,
    #[serde(default)]
    pub total_runs: u64,
    #[serde(default)]
    pub successful_runs: u64,
    #[serde(default)]
    pub failed_runs: u64,
    #[serde(default)]
    pub posts_count: u64,
    /// Newest first, capped at [`MAX_STORED_ERRORS`].
    #[serde(default)]
    pub errors: Vec<ErrorEntry>,
    #[serde(default)]
    pub sources_status: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorEntry {
    pub timestamp: String,
    pub formatted_time: String,
    pub source: String,
    pub error: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Health {
    Unknown,
    Healthy,
    Unhealthy(&'static str),
}

impl std::fmt::Display for Health {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Health::Unknown => write!(f, "Unknown"),
            Health::Healthy => write!(f, "Healthy"),
            Health::Unhealthy(reason) => write!(f, "Unhealthy - {reason}"),
        }
    }
}

pub struct RunMonitor {
    path: PathBuf,
    status: RunStatus,
    /// Errors buffered for the in-flight run, merged on complete.
    run_errors: Vec<ErrorEntry>,
}

impl RunMonitor {
    /// Open status storage, starting fresh when the file is absent or broken.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let status = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                error!(error = ?e, path = %path.display(), "status file unreadable, starting fresh");
                RunStatus::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => RunStatus::default(),
            Err(e) => {
                error!(error = ?e, path = %path.display(), "status read failed, starting fresh");
                RunStatus::default()
            }
        };
        Self {
            path,
            status,
            run_errors: Vec::new(),
        }
    }

    pub fn status(&self) -> &RunStatus {
        &self.status
    }

    /// Open a run: stamp the clock, bump the counter, clear the error buffer.
    /// Returns the run id.
    pub fn record_run_start(&mut self) -> u64 {
        let now = Local::now();
        self.status.last_run = Some(now.to_rfc3339());
        self.status.last_run_formatted = Some(now.format("%B %d, %Y at %I:%M %p").to_string());
        self.status.last_run_timestamp = Some(now.timestamp().max(0) as u64);
        self.status.total_runs += 1;
        self.run_errors.clear();
        self.save();
        self.status.total_runs
    }

    /// Buffer an error for the in-flight run.
    pub fn record_error(&mut self, source: &str, message: &str) {
        let now = Local::now();
        self.run_errors.push(ErrorEntry {
            timestamp: now.to_rfc3339(),
            formatted_time: now.format("%B %d, %Y at %I:%M %p").to_string(),
            source: source.to_string(),
            error: message.to_string(),
        });
    }

    /// Close a run: update counters, merge buffered errors to the front of
    /// the durable list, and persist.
    pub fn record_run_complete(
        &mut self,
        success: bool,
        posts: u64,
        source_statuses: BTreeMap<String, String>,
    ) {
        if success {
            self.status.successful_runs += 1;
        } else {
            self.status.failed_runs += 1;
        }
        self.status.posts_count += posts;
        if !source_statuses.is_empty() {
            self.status.sources_status = source_statuses;
        }
        if !self.run_errors.is_empty() {
            let mut merged = std::mem::take(&mut self.run_errors);
            merged.append(&mut self.status.errors);
            merged.truncate(MAX_STORED_ERRORS);
            self.status.errors = merged;
        }
        self.save();
    }

    pub fn health(&self, expected_interval_secs: u64) -> Health {
        self.health_at(
            expected_interval_secs,
            chrono::Utc::now().timestamp().max(0) as u64,
        )
    }

    /// Stale runs and a high failure ratio both flip the bot to Unhealthy.
    pub fn health_at(&self, expected_interval_secs: u64, now: u64) -> Health {
        let Some(last_run) = self.status.last_run_timestamp else {
            return Health::Unknown;
        };
        if now.saturating_sub(last_run) > expected_interval_secs * 2 {
            return Health::Unhealthy("Last run too long ago");
        }
        if self.status.total_runs > 0 {
            let rate = self.status.failed_runs as f64 / self.status.total_runs as f64;
            if rate > 0.3 {
                return Health::Unhealthy("High error rate");
            }
        }
        Health::Healthy
    }

    /// Formatted snapshot: health, counters, last run, per-source status, and
    /// the most recent errors.
    pub fn status_report(&self, expected_interval_secs: u64) -> String {
        let s = &self.status;
        let mut report = String::from("🤖 *Digest Bot Status Report*\n\n");
        report.push_str(&format!("*Health:* {}\n", self.health(expected_interval_secs)));
        match &s.last_run_formatted {
            Some(formatted) => report.push_str(&format!("*Last run:* {formatted}\n")),
            None => report.push_str("*Last run:* Never\n"),
        }
        report.push_str(&format!("*Total runs:* {}\n", s.total_runs));
        report.push_str(&format!("*Successful:* {}\n", s.successful_runs));
        report.push_str(&format!("*Failed:* {}\n", s.failed_runs));
        report.push_str(&format!("*Posts made:* {}\n\n", s.posts_count));

        report.push_str("*Sources:*\n");
        for (name, status) in &s.sources_status {
            report.push_str(&format!("- {name}: {status}\n"));
        }

        if !s.errors.is_empty() {
            report.push_str("\n*Recent errors:*\n");
            for (i, err) in s.errors.iter().take(REPORT_ERROR_LIMIT).enumerate() {
                report.push_str(&format!(
                    "{}. *{}* [{}] {}\n",
                    i + 1,
                    err.formatted_time,
                    err.source,
                    err.error
                ));
            }
        }

        report
    }

    fn save(&self) {
        let content = match serde_json::to_string_pretty(&self.status) {
            Ok(content) => content,
            Err(e) => {
                error!(error = ?e, "status serialization failed");
                return;
            }
        };
        let tmp = self.path.with_extension("tmp");
        let result = fs::write(&tmp, content).and_then(|_| fs::rename(&tmp, &self.path));
        if let Err(e) = result {
            error!(error = ?e, path = %self.path.display(), "status save failed");
        }
    }
}
