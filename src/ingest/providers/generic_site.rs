// src/ingest/providers/generic_site.rs
//! Fallback website adapter: repeated `<article>` blocks, first
//! heading-or-link as title, first paragraph as description.

use anyhow::Result;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};

use crate::config::SourceConfig;
use crate::ingest::http;
use crate::ingest::types::{Item, SourceProvider};
use crate::ingest::{collapse_ws, make_absolute};

static SEL_ARTICLE: Lazy<Selector> = Lazy::new(|| Selector::parse("article").unwrap());
static SEL_TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("h1, h2, h3, a").unwrap());
static SEL_LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());
static SEL_PARA: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());

pub struct GenericSiteProvider {
    name: String,
    url: String,
    client: reqwest::Client,
}

impl GenericSiteProvider {
    pub fn new(cfg: &SourceConfig, client: reqwest::Client) -> Self {
        Self {
            name: cfg.name.clone(),
            url: cfg.url.clone(),
            client,
        }
    }
}

#[async_trait]
impl SourceProvider for GenericSiteProvider {
    async fn fetch_items(&self) -> Result<Vec<Item>> {
        let html = http::get_text(&self.client, &self.url, http::DEFAULT_RETRIES).await?;
        let items = parse_articles(&html, &self.url);
        tracing::info!(source = %self.name, count = items.len(), "parsed generic articles");
        Ok(items)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Heuristic extraction from repeated content blocks. Links resolve against
/// the page url; a block without its own link falls back to the page itself.
pub fn parse_articles(html: &str, page_url: &str) -> Vec<Item> {
    let doc = Html::parse_document(html);
    let mut items = Vec::new();

    for art in doc.select(&SEL_ARTICLE) {
        let Some(title_el) = art.select(&SEL_TITLE).next() else {
            tracing::debug!("article block skipped: no heading or link");
            continue;
        };
        let title = collapse_ws(&title_el.text().collect::<String>());
        if title.is_empty() {
            tracing::debug!("article block skipped: empty title");
            continue;
        }
        // href on the matched element itself, or on a link nested in the heading
        let href = title_el
            .value()
            .attr("href")
            .or_else(|| {
                title_el
                    .select(&SEL_LINK)
                    .next()
                    .and_then(|a| a.value().attr("href"))
            })
            .filter(|href| !href.trim().is_empty());
        let url = href
            .map(|href| make_absolute(href.trim(), page_url))
            .unwrap_or_else(|| page_url.to_string());
        let description = art
            .select(&SEL_PARA)
            .next()
            .map(|p| collapse_ws(&p.text().collect::<String>()))
            .filter(|d| !d.is_empty());

        items.push(Item {
            title,
            url,
            description,
            ..Default::default()
        });
    }

    items
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <article>
            <h2><a href="/posts/brain-mapping">Brain mapping milestone</a></h2>
            <p>A new atlas of the cortex.</p>
          </article>
          <article>
            <h3>Untitled lab notes</h3>
            <p>No link on this one.</p>
          </article>
          <article><div>nothing useful</div></article>
        </body></html>
    "#;

    #[test]
    fn repeated_blocks_become_items() {
        let items = parse_articles(PAGE, "https://example.com/news/");
        assert_eq!(items.len(), 2);

        assert_eq!(items[0].title, "Brain mapping milestone");
        assert_eq!(items[0].url, "https://example.com/posts/brain-mapping");
        assert_eq!(items[0].description.as_deref(), Some("A new atlas of the cortex."));

        // heading without href falls back to the page url
        assert_eq!(items[1].title, "Untitled lab notes");
        assert_eq!(items[1].url, "https://example.com/news/");
    }
}
