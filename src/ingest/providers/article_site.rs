// src/ingest/providers/article_site.rs
//! Adapter for article-card news sites (neurosciencenews.com layout).
//!
//! Listing pages expose `div.meta` cards with an `h3.title a` link and an
//! excerpt block; deeper metadata (author, source, original research, date)
//! lives on the article page itself. Pagination follows `{base}/page/{n}/`
//! up to the configured page cap, with polite delays between page and
//! article-detail fetches. A detail-fetch failure degrades to listing data.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use crate::config::SourceConfig;
use crate::ingest::http;
use crate::ingest::types::{Item, ResearchRef, SourceProvider};
use crate::ingest::{collapse_ws, make_absolute};

const PAGE_DELAY_SECS: u64 = 2;
const DETAIL_DELAY_SECS: u64 = 1;
const PAGE_RETRIES: u8 = 2;

static SEL_CARD: Lazy<Selector> = Lazy::new(|| Selector::parse("div.meta").unwrap());
static SEL_TITLE_LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("h3.title a").unwrap());
static SEL_EXCERPT: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"div[class*="excerpt"]"#).unwrap());
static SEL_READ_MORE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"div[class*="read-more"]"#).unwrap());
static SEL_CARD_PARA: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());
static SEL_CONTENT_PARA: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.entry-content p").unwrap());
static SEL_META_LABEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p.has-background strong").unwrap());
static SEL_DATE: Lazy<Selector> = Lazy::new(|| Selector::parse("time.entry-date").unwrap());

pub struct ArticleSiteProvider {
    name: String,
    url: String,
    max_pages: u32,
    client: reqwest::Client,
    page_delay: Duration,
    detail_delay: Duration,
}

impl ArticleSiteProvider {
    pub fn new(cfg: &SourceConfig, client: reqwest::Client) -> Self {
        Self {
            name: cfg.name.clone(),
            url: cfg.url.clone(),
            max_pages: cfg.max_pages,
            client,
            page_delay: Duration::from_secs(PAGE_DELAY_SECS),
            detail_delay: Duration::from_secs(DETAIL_DELAY_SECS),
        }
    }

    /// Shrink the polite delays (tests).
    pub fn with_delays(mut self, page_delay: Duration, detail_delay: Duration) -> Self {
        self.page_delay = page_delay;
        self.detail_delay = detail_delay;
        self
    }

    async fn collect_page(&self, html: &str, page_url: &str, out: &mut Vec<Item>) {
        let stubs = parse_listing(html, page_url);
        tracing::info!(source = %self.name, count = stubs.len(), page_url, "found article cards");
        for (idx, stub) in stubs.into_iter().enumerate() {
            if idx > 0 {
                tokio::time::sleep(self.detail_delay).await;
            }
            out.push(self.resolve_detail(stub).await);
        }
    }

    async fn resolve_detail(&self, stub: CardStub) -> Item {
        let mut item = Item {
            title: stub.title,
            url: stub.url,
            description: stub.description,
            ..Default::default()
        };
        match http::get_text(&self.client, &item.url, http::DEFAULT_RETRIES).await {
            Ok(html) => {
                let meta = parse_detail(&html, &item.url);
                if item.description.is_none() {
                    item.description = meta.description;
                }
                item.author = meta.author;
                item.date = meta.date;
                item.source_label = meta.source_label;
                item.research = meta.research;
            }
            Err(e) => {
                tracing::warn!(error = ?e, url = %item.url, "article detail fetch failed");
            }
        }
        item
    }
}

#[async_trait]
impl SourceProvider for ArticleSiteProvider {
    async fn fetch_items(&self) -> Result<Vec<Item>> {
        let mut items = Vec::new();

        let first = http::get_text(&self.client, &self.url, http::DEFAULT_RETRIES).await?;
        self.collect_page(&first, &self.url, &mut items).await;

        let base = self.url.trim_end_matches('/').to_string();
        let mut page = 1u32;
        while page < self.max_pages {
            page += 1;
            tokio::time::sleep(self.page_delay).await;
            let page_url = format!("{base}/page/{page}/");
            match http::get_text(&self.client, &page_url, PAGE_RETRIES).await {
                Ok(html) => self.collect_page(&html, &page_url, &mut items).await,
                Err(e) => {
                    tracing::warn!(error = ?e, page, "page fetch failed, stopping pagination");
                    break;
                }
            }
        }

        tracing::info!(source = %self.name, count = items.len(), pages = page, "article scrape done");
        Ok(items)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Listing-page fragment of an article, before the detail fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardStub {
    pub title: String,
    pub url: String,
    pub description: Option<String>,
}

/// Metadata scraped from an article detail page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailMeta {
    pub description: Option<String>,
    pub author: Option<String>,
    pub date: Option<String>,
    pub source_label: Option<String>,
    pub research: Option<ResearchRef>,
}

pub fn parse_listing(html: &str, page_url: &str) -> Vec<CardStub> {
    let doc = Html::parse_document(html);
    let mut stubs = Vec::new();

    for card in doc.select(&SEL_CARD) {
        let Some(link) = card.select(&SEL_TITLE_LINK).next() else {
            tracing::debug!("card skipped: no title link");
            continue;
        };
        let title = collapse_ws(&link.text().collect::<String>());
        let Some(href) = link.value().attr("href").filter(|h| !h.trim().is_empty()) else {
            tracing::debug!(title = %title, "card skipped: title link has no href");
            continue;
        };
        if title.is_empty() {
            tracing::debug!(href, "card skipped: empty title");
            continue;
        }
        let url = make_absolute(href.trim(), page_url);
        let description = excerpt_text(card);
        if description.is_none() {
            tracing::debug!(title = %title, "no description found on listing card");
        }
        stubs.push(CardStub {
            title,
            url,
            description,
        });
    }

    stubs
}

/// Excerpt block with the trailing read-more link removed; any paragraph in
/// the card is the last resort.
fn excerpt_text(card: ElementRef) -> Option<String> {
    if let Some(excerpt) = card.select(&SEL_EXCERPT).next() {
        let mut text: String = excerpt.text().collect();
        if let Some(read_more) = excerpt.select(&SEL_READ_MORE).next() {
            let rm_text: String = read_more.text().collect();
            if !rm_text.trim().is_empty() {
                text = text.replace(&rm_text, "");
            }
        }
        let text = collapse_ws(&text);
        if !text.is_empty() {
            return Some(text);
        }
    }
    card.select(&SEL_CARD_PARA)
        .next()
        .map(|p| collapse_ws(&p.text().collect::<String>()))
        .filter(|t| !t.is_empty())
}

pub fn parse_detail(html: &str, article_url: &str) -> DetailMeta {
    let doc = Html::parse_document(html);
    let mut meta = DetailMeta::default();

    // A "Summary:" paragraph wins; otherwise the first content paragraph.
    let mut first_para = None;
    for p in doc.select(&SEL_CONTENT_PARA) {
        let text = collapse_ws(&p.text().collect::<String>());
        if text.is_empty() {
            continue;
        }
        if let Some(rest) = text.strip_prefix("Summary:") {
            meta.description = Some(rest.trim().to_string());
            break;
        }
        if first_para.is_none() {
            first_para = Some(text);
        }
    }
    if meta.description.is_none() {
        meta.description = first_para;
    }

    for strong in doc.select(&SEL_META_LABEL) {
        let label = collapse_ws(&strong.text().collect::<String>());
        if label.starts_with("Author:") {
            meta.author = label_value(strong);
        } else if label.starts_with("Source:") {
            meta.source_label = label_value(strong);
        } else if label.starts_with("Original Research:") {
            meta.research = research_ref(strong, article_url);
        }
    }

    if let Some(time) = doc.select(&SEL_DATE).next() {
        meta.date = time
            .value()
            .attr("datetime")
            .map(str::to_string)
            .or_else(|| {
                let text = collapse_ws(&time.text().collect::<String>());
                (!text.is_empty()).then_some(text)
            });
    }

    meta
}

/// Value following a `<strong>Label:</strong>` marker: an immediate link's
/// text, else the trailing text node. Stops at the next label.
fn label_value(strong: ElementRef) -> Option<String> {
    for node in strong.next_siblings() {
        if let Some(el) = ElementRef::wrap(node) {
            match el.value().name() {
                "a" => {
                    let text = collapse_ws(&el.text().collect::<String>());
                    return (!text.is_empty()).then_some(text);
                }
                "strong" => return None,
                _ => continue,
            }
        }
        if let Some(text) = node.value().as_text() {
            let t = collapse_ws(&text.text);
            if !t.is_empty() {
                return Some(t);
            }
        }
    }
    None
}

/// Research reference, in priority order: link title+href, link title only,
/// raw trailing text.
fn research_ref(strong: ElementRef, article_url: &str) -> Option<ResearchRef> {
    for node in strong.next_siblings() {
        if let Some(el) = ElementRef::wrap(node) {
            match el.value().name() {
                "a" => {
                    let title = collapse_ws(&el.text().collect::<String>());
                    if title.is_empty() {
                        return None;
                    }
                    let url = el
                        .value()
                        .attr("href")
                        .filter(|h| !h.trim().is_empty())
                        .map(|h| make_absolute(h.trim(), article_url));
                    return Some(ResearchRef {
                        title: Some(title),
                        url,
                        text: None,
                    });
                }
                "strong" => return None,
                _ => continue,
            }
        }
        if let Some(text) = node.value().as_text() {
            let raw = collapse_ws(&text.text);
            if !raw.is_empty() {
                let trimmed = raw
                    .strip_prefix("Original Research:")
                    .map(|rest| rest.trim().to_string())
                    .unwrap_or(raw);
                return Some(ResearchRef {
                    title: None,
                    url: None,
                    text: Some(format!("Research: {trimmed}")),
                });
            }
        }
    }
    None
}
