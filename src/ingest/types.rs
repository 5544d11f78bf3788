// src/ingest/types.rs
use anyhow::Result;

/// One normalized piece of content. The `url` is the identity key used by the
/// posted-URL ledger; `id`-or-`title` is the dedup identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Item {
    pub title: String,
    pub url: String,
    pub id: Option<String>,
    pub description: Option<String>,
    pub author: Option<String>,
    pub date: Option<String>,
    pub source_label: Option<String>,
    pub research: Option<ResearchRef>,
    /// Provenance, stamped from the source config when the adapter left it empty.
    pub source: String,
    /// Routing tag; empty means uncategorized (falls back to news).
    pub category: String,
}

/// Reference to an original research paper attached to an article.
/// A clickable title+url pair, a bare title, or a raw free-text fallback.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResearchRef {
    pub title: Option<String>,
    pub url: Option<String>,
    pub text: Option<String>,
}

#[async_trait::async_trait]
pub trait SourceProvider: Send + Sync {
    async fn fetch_items(&self) -> Result<Vec<Item>>;
    fn name(&self) -> &str;
}
