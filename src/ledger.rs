// src/ledger.rs
//! Durable record of already-posted item URLs.
//!
//! Append-only line format `url|unix_timestamp`; legacy lines carrying only a
//! URL never expire. Entries past the retention window are excluded from
//! duplicate checks, and the file is trimmed to a cap when the live set
//! outgrows it. Every I/O failure degrades (empty set / no-op) — losing the
//! ledger must never abort a run; the worst case is a repeated post.

use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use tracing::{error, info};

pub const URL_RETENTION_DAYS: u64 = 90;
pub const MAX_STORED_URLS: usize = 5000;

pub struct PostedLedger {
    path: PathBuf,
    retention_secs: u64,
    cap: usize,
}

impl PostedLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            retention_secs: URL_RETENTION_DAYS * 24 * 3600,
            cap: MAX_STORED_URLS,
        }
    }

    pub fn with_retention_days(mut self, days: u64) -> Self {
        self.retention_secs = days * 24 * 3600;
        self
    }

    pub fn with_cap(mut self, cap: usize) -> Self {
        self.cap = cap;
        self
    }

    /// Live (non-expired) posted URLs.
    pub fn load(&self) -> HashSet<String> {
        self.load_at(now_unix())
    }

    pub fn load_at(&self, now: u64) -> HashSet<String> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return HashSet::new(),
            Err(e) => {
                error!(error = ?e, path = %self.path.display(), "ledger read failed");
                return HashSet::new();
            }
        };

        let mut live = HashSet::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match parse_line(line) {
                (url, Some(ts)) => {
                    if !self.expired(ts, now) {
                        live.insert(url.to_string());
                    }
                }
                // legacy line without a parseable timestamp: always live
                (url, None) => {
                    live.insert(url.to_string());
                }
            }
        }

        if live.len() > self.cap {
            info!(live = live.len(), cap = self.cap, "ledger over cap, purging");
            self.purge();
        }

        live
    }

    /// Append one posted URL with the current timestamp. Safe to call many
    /// times per run.
    pub fn record(&self, url: &str) {
        self.record_at(url, now_unix());
    }

    pub fn record_at(&self, url: &str, now: u64) {
        let result = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| file.write_all(format!("{url}|{now}\n").as_bytes()));
        if let Err(e) = result {
            error!(error = ?e, path = %self.path.display(), "ledger append failed");
        }
    }

    /// Rewrite the file keeping only the cap most-recently-posted entries.
    /// Entries without a parseable timestamp sort as oldest.
    pub fn purge(&self) {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(_) => return,
        };

        let mut entries: Vec<(String, u64)> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| {
                let (url, ts) = parse_line(line);
                (url.to_string(), ts.unwrap_or(0))
            })
            .collect();
        let total = entries.len();

        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries.truncate(self.cap);

        let out: String = entries
            .iter()
            .map(|(url, ts)| format!("{url}|{ts}\n"))
            .collect();
        match self.write_atomic(&out) {
            Ok(()) => info!(kept = entries.len(), total, "ledger purge complete"),
            Err(e) => error!(error = ?e, "ledger purge write failed"),
        }
    }

    fn write_atomic(&self, content: &str) -> std::io::Result<()> {
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &self.path)
    }

    fn expired(&self, ts: u64, now: u64) -> bool {
        now.saturating_sub(ts) > self.retention_secs
    }
}

/// Split `url|timestamp`; the timestamp may be a float (older files).
fn parse_line(line: &str) -> (&str, Option<u64>) {
    match line.rsplit_once('|') {
        Some((url, ts)) => match ts.trim().parse::<f64>() {
            Ok(ts) if ts >= 0.0 => (url, Some(ts as u64)),
            _ => (line, None),
        },
        None => (line, None),
    }
}

fn now_unix() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}
