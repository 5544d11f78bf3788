// src/categorize.rs
//! Buckets items into the fixed set of channel categories.

use metrics::counter;

use crate::ingest::types::Item;

/// Fixed routing buckets, in channel order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    News,
    Events,
    Jobs,
    VideosCourses,
    Facts,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::News,
        Category::Events,
        Category::Jobs,
        Category::VideosCourses,
        Category::Facts,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            Category::News => "news",
            Category::Events => "events",
            Category::Jobs => "jobs",
            Category::VideosCourses => "videos/courses",
            Category::Facts => "facts",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Category> {
        Category::ALL.iter().copied().find(|c| c.tag() == tag)
    }
}

/// Partition items into the fixed buckets, preserving input order within each
/// bucket. Unknown or missing tags land in `news` and are counted as
/// fallbacks rather than silently merged.
pub fn categorize(items: Vec<Item>) -> Vec<(Category, Vec<Item>)> {
    let mut buckets: Vec<(Category, Vec<Item>)> =
        Category::ALL.iter().map(|c| (*c, Vec::new())).collect();
    let mut fallback = 0usize;

    for item in items {
        let cat = match Category::from_tag(item.category.trim()) {
            Some(c) => c,
            None => {
                fallback += 1;
                Category::News
            }
        };
        buckets[cat as usize].1.push(item);
    }

    for (cat, bucket) in &buckets {
        tracing::debug!(category = cat.tag(), count = bucket.len(), "categorized items");
    }
    if fallback > 0 {
        tracing::warn!(count = fallback, "items with unknown category routed to news");
        counter!("categorize_fallback_total").increment(fallback as u64);
    }

    buckets
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str, category: &str) -> Item {
        Item {
            title: title.to_string(),
            url: format!("https://example.com/{title}"),
            category: category.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn every_item_lands_in_exactly_one_bucket() {
        let items = vec![
            item("a", "news"),
            item("b", "jobs"),
            item("c", "videos/courses"),
            item("d", "mystery"),
            item("e", ""),
            item("f", "facts"),
        ];
        let input_len = items.len();
        let buckets = categorize(items);

        let total: usize = buckets.iter().map(|(_, b)| b.len()).sum();
        assert_eq!(total, input_len);

        // fixed order, all buckets present
        let order: Vec<Category> = buckets.iter().map(|(c, _)| *c).collect();
        assert_eq!(order.as_slice(), Category::ALL.as_slice());
    }

    #[test]
    fn unknown_and_missing_tags_fall_back_to_news() {
        let buckets = categorize(vec![item("x", "not-a-category"), item("y", "")]);
        assert_eq!(buckets[0].0, Category::News);
        assert_eq!(buckets[0].1.len(), 2);
    }

    #[test]
    fn order_within_bucket_is_preserved() {
        let buckets = categorize(vec![item("first", "events"), item("second", "events")]);
        let events = &buckets[1].1;
        assert_eq!(events[0].title, "first");
        assert_eq!(events[1].title, "second");
    }
}
