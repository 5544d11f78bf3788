// src/ingest/mod.rs
pub mod http;
pub mod providers;
pub mod types;

use std::collections::{BTreeMap, HashSet};

use metrics::{counter, describe_counter, describe_gauge};
use once_cell::sync::OnceCell;

use crate::config::SourceConfig;
use crate::monitor::RunMonitor;
use types::{Item, SourceProvider};

/// One-time metrics registration (so series are described before first use).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("fetch_items_total", "Items fetched across all sources.");
        describe_counter!("fetch_source_errors_total", "Source fetch/parse errors.");
        describe_counter!("dedup_removed_total", "Items removed as duplicates.");
        describe_counter!(
            "relevance_removed_total",
            "Items dropped by the relevance filter."
        );
        describe_counter!(
            "categorize_fallback_total",
            "Items with unknown category routed to news."
        );
        describe_counter!("messages_sent_total", "Messages accepted by the channel.");
        describe_counter!("messages_failed_total", "Messages dropped after send failure.");
        describe_counter!("runs_total", "Collection runs started.");
        describe_gauge!("pipeline_last_run_ts", "Unix ts when the pipeline last ran.");
    });
}

/// A source from the config bound to its concrete provider.
pub struct ConfiguredSource {
    pub name: String,
    pub category: Option<String>,
    pub provider: Box<dyn SourceProvider>,
}

pub fn build_sources(cfgs: &[SourceConfig], client: &reqwest::Client) -> Vec<ConfiguredSource> {
    cfgs.iter()
        .map(|cfg| ConfiguredSource {
            name: cfg.name.clone(),
            category: cfg.category.clone(),
            provider: providers::provider_for(cfg, client.clone()),
        })
        .collect()
}

/// Fetch every configured source. A failing source contributes zero items and
/// never aborts the run; its error lands in the run monitor and the returned
/// per-source status map.
pub async fn fetch_all(
    sources: &[ConfiguredSource],
    monitor: &mut RunMonitor,
) -> (Vec<Item>, BTreeMap<String, String>) {
    let mut all = Vec::new();
    let mut statuses = BTreeMap::new();

    for src in sources {
        match src.provider.fetch_items().await {
            Ok(mut items) => {
                for it in items.iter_mut() {
                    if it.source.is_empty() {
                        it.source = src.name.clone();
                    }
                    if it.category.is_empty() {
                        if let Some(cat) = &src.category {
                            it.category = cat.clone();
                        }
                    }
                }
                counter!("fetch_items_total").increment(items.len() as u64);
                tracing::info!(source = %src.name, count = items.len(), "fetched items");
                let status = if items.is_empty() {
                    "No data".to_string()
                } else {
                    format!("OK ({} items)", items.len())
                };
                statuses.insert(src.name.clone(), status);
                all.append(&mut items);
            }
            Err(e) => {
                tracing::warn!(error = ?e, source = %src.name, "source fetch failed");
                counter!("fetch_source_errors_total").increment(1);
                monitor.record_error(&src.name, &format!("{e:#}"));
                statuses.insert(src.name.clone(), format!("Error: {e:#}"));
            }
        }
    }

    (all, statuses)
}

/// Deduplicate by identifier (`id`, else `title`), keeping the first
/// occurrence in input order, then drop items failing the relevance
/// predicate. Returns (kept, dup_removed, irrelevant_removed); both passes
/// are total.
pub fn dedup_and_filter(items: Vec<Item>) -> (Vec<Item>, usize, usize) {
    let mut seen: HashSet<String> = HashSet::new();
    let mut unique = Vec::with_capacity(items.len());
    let mut dup_removed = 0usize;

    for item in items {
        let identifier = item
            .id
            .clone()
            .unwrap_or_else(|| item.title.clone());
        if identifier.is_empty() || !seen.insert(identifier) {
            dup_removed += 1;
            continue;
        }
        unique.push(item);
    }

    let before = unique.len();
    unique.retain(is_relevant);
    let irrelevant_removed = before - unique.len();

    (unique, dup_removed, irrelevant_removed)
}

/// An item without both a title and a url never reaches the pipeline.
pub fn is_relevant(item: &Item) -> bool {
    !item.title.trim().is_empty() && !item.url.trim().is_empty()
}

/// Resolve a possibly-relative href against the page it came from.
pub fn make_absolute(href: &str, base: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }
    match url::Url::parse(base).and_then(|b| b.join(href)) {
        Ok(resolved) => resolved.to_string(),
        Err(e) => {
            tracing::warn!(error = ?e, href, base, "could not resolve relative url");
            href.to_string()
        }
    }
}

/// Collapse runs of whitespace and trim.
pub(crate) fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
