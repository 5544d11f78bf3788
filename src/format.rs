// src/format.rs
//! Renders categorized items into Telegram MarkdownV2 message blocks.
//!
//! Only reads the posted set; recording a URL as posted is the delivery
//! pipeline's job, after the channel has actually accepted the message.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate};
use once_cell::sync::OnceCell;
use regex::Regex;

use crate::categorize::Category;
use crate::ingest::types::{Item, ResearchRef};

/// Visible length cap for descriptions.
pub const MAX_DESCRIPTION_CHARS: usize = 500;

/// One `(formatted_text, url)` pair per item whose URL is not already in the
/// live posted set. Output follows category order, then item order.
pub fn format_messages(
    categorized: &[(Category, Vec<Item>)],
    posted: &HashSet<String>,
) -> Vec<(String, String)> {
    let mut messages = Vec::new();
    for (_, items) in categorized {
        for item in items {
            if item.url.is_empty() || posted.contains(&item.url) {
                continue;
            }
            messages.push((render_item(item), item.url.clone()));
        }
    }
    messages
}

fn render_item(item: &Item) -> String {
    let mut msg = format!("*{}*\n\n", escape_markdown(&item.title));

    if let Some(desc) = item.description.as_deref() {
        let cleaned = clean_description(desc);
        if !cleaned.is_empty() {
            msg.push_str(&truncate_description(&escape_markdown(&cleaned)));
            msg.push_str("\n\n");
        }
    }

    if let Some(author) = &item.author {
        msg.push_str(&format!("*👤 Author:* {}\n", escape_markdown(author)));
    }
    if let Some(date) = &item.date {
        msg.push_str(&format!("*🗓 Date:* {}\n", escape_markdown(&format_date(date))));
    }
    if let Some(label) = &item.source_label {
        msg.push_str(&format!("*📌 Source:* {}\n", escape_markdown(label)));
    }
    if let Some(research) = &item.research {
        if let Some(line) = research_line(research) {
            msg.push_str(&line);
            msg.push('\n');
        }
    }

    msg.push('\n');
    // only visible text is escaped, never the URL itself
    msg.push_str(&format!("[📖 Read Article]({})\n", item.url));
    msg.trim().to_string()
}

/// Escape Telegram MarkdownV2 reserved characters in visible text.
pub fn escape_markdown(text: &str) -> String {
    const RESERVED: &str = "_[]()~`>#+-=|{}.!";
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if RESERVED.contains(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Strip a leading "Summary:" label, leftover inline markup, and stray
/// entities from a scraped or API-supplied description.
fn clean_description(raw: &str) -> String {
    let mut desc = html_escape::decode_html_entities(raw.trim()).to_string();
    if let Some(rest) = desc.strip_prefix("Summary:") {
        desc = rest.trim().to_string();
    }
    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").unwrap());
    desc = re_tags.replace_all(&desc, "").to_string();
    desc.trim().to_string()
}

/// Cap an escaped description, preferring the last sentence boundary inside
/// the window when it covers most of the text.
fn truncate_description(escaped: &str) -> String {
    if escaped.chars().count() <= MAX_DESCRIPTION_CHARS {
        return escaped.to_string();
    }
    let window: String = escaped.chars().take(MAX_DESCRIPTION_CHARS).collect();
    match window.rfind('.') {
        Some(cut) if cut > window.len() * 6 / 10 => window[..=cut].to_string(),
        _ => window,
    }
}

/// ISO-8601 dates become "May 15, 2025"; anything unparseable passes through.
fn format_date(raw: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.format("%B %d, %Y").to_string();
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.format("%B %d, %Y").to_string();
    }
    raw.to_string()
}

/// Research line: clickable title+url, title only, then raw free text.
fn research_line(research: &ResearchRef) -> Option<String> {
    if let (Some(title), Some(url)) = (&research.title, &research.url) {
        // escape parens inside the link target, not the rest of the URL
        let safe_url = url.replace('(', "\\(").replace(')', "\\)");
        return Some(format!(
            "📝 *Research:* [{}]({})",
            escape_markdown(title),
            safe_url
        ));
    }
    if let Some(title) = &research.title {
        return Some(format!("📝 *Research:* {}", escape_markdown(title)));
    }
    research
        .text
        .as_ref()
        .map(|text| format!("📝 {}", escape_markdown(text)))
}
