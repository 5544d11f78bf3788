// tests/website_parse.rs
use neuro_digest_bot::ingest::providers::article_site::{parse_detail, parse_listing};

#[test]
fn listing_cards_become_stubs() {
    let html: &str = include_str!("fixtures/article_listing.html");
    let stubs = parse_listing(html, "https://neurosciencenews.com/neuroscience/");

    // the card without a title link is skipped
    assert_eq!(stubs.len(), 2);

    assert_eq!(stubs[0].title, "Memory traces mapped during sleep");
    assert_eq!(
        stubs[0].url,
        "https://neurosciencenews.com/neuroscience/memory-trace-123/"
    );
    let desc = stubs[0].description.as_deref().unwrap();
    assert!(desc.contains("memory traces replay"));
    assert!(!desc.contains("Read More"));

    // absolute hrefs pass through; paragraph is the description fallback
    assert_eq!(
        stubs[1].url,
        "https://neurosciencenews.com/synapse-pruning-456/"
    );
    assert_eq!(
        stubs[1].description.as_deref(),
        Some("Microglia trim unused connections at a surprising rate.")
    );
}

#[test]
fn detail_page_yields_full_metadata() {
    let html: &str = include_str!("fixtures/article_detail.html");
    let meta = parse_detail(html, "https://neurosciencenews.com/memory-trace-123/");

    assert_eq!(
        meta.description.as_deref(),
        Some("Sleep replays the day's experiences to consolidate memory.")
    );
    assert_eq!(meta.author.as_deref(), Some("Jane Doe"));
    assert_eq!(meta.source_label.as_deref(), Some("Example University"));
    assert_eq!(meta.date.as_deref(), Some("2025-05-15T13:25:41-07:00"));

    let research = meta.research.unwrap();
    assert_eq!(
        research.title.as_deref(),
        Some("Open access paper on memory replay")
    );
    assert_eq!(research.url.as_deref(), Some("https://doi.example/10.1000/xyz"));
    assert_eq!(research.text, None);
}

#[test]
fn detail_without_summary_uses_first_paragraph() {
    let html = r#"
        <div class="entry-content">
          <p>First body paragraph stands in for the summary.</p>
          <p>Second paragraph.</p>
        </div>
    "#;
    let meta = parse_detail(html, "https://example.com/a/");
    assert_eq!(
        meta.description.as_deref(),
        Some("First body paragraph stands in for the summary.")
    );
}

#[test]
fn research_degrades_to_title_then_raw_text() {
    let title_only = r#"
        <p class="has-background">
          <strong>Original Research:</strong> <a>Closed access study</a>
        </p>
    "#;
    let meta = parse_detail(title_only, "https://example.com/a/");
    let research = meta.research.unwrap();
    assert_eq!(research.title.as_deref(), Some("Closed access study"));
    assert_eq!(research.url, None);

    let raw_text = r#"
        <p class="has-background">
          <strong>Original Research:</strong> The findings will appear in press.
        </p>
    "#;
    let meta = parse_detail(raw_text, "https://example.com/a/");
    let research = meta.research.unwrap();
    assert_eq!(research.title, None);
    assert_eq!(
        research.text.as_deref(),
        Some("Research: The findings will appear in press.")
    );
}

#[test]
fn relative_research_links_resolve_against_article() {
    let html = r#"
        <p class="has-background">
          <strong>Original Research:</strong> <a href="/papers/42">Companion paper</a>
        </p>
    "#;
    let meta = parse_detail(html, "https://journal.example/articles/today/");
    let research = meta.research.unwrap();
    assert_eq!(research.url.as_deref(), Some("https://journal.example/papers/42"));
}
