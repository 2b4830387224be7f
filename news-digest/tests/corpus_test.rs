use chrono::{TimeZone, Utc};
use news_digest::recency::filter_recent;
use news_digest::{Article, CategorySelector, Deduplicator, RawEntry, SelectionPolicy};
use std::collections::HashMap;

mod common;
use common::{article, hours_ago, init_tracing};

fn entry(link: &str, published: Option<chrono::DateTime<Utc>>) -> RawEntry {
    RawEntry {
        title: link.to_string(),
        summary: String::new(),
        link: link.to_string(),
        published,
        content: None,
        image_url: None,
    }
}

#[test]
fn test_recency_window_is_strict() {
    init_tracing();
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let entries = vec![
        entry("fresh", Some(hours_ago(now, 1))),
        entry("boundary", Some(hours_ago(now, 24))),
        entry("old", Some(hours_ago(now, 30))),
        entry("undated", None),
        entry("almost", Some(hours_ago(now, 24) + chrono::Duration::seconds(1))),
    ];

    let kept: Vec<String> = filter_recent(entries, 24, now).into_iter().map(|e| e.link).collect();

    assert_eq!(kept, vec!["fresh".to_string(), "almost".to_string()]);
}

#[test]
fn test_recency_respects_configured_window() {
    let now = Utc::now();
    let entries = vec![entry("a", Some(hours_ago(now, 30))), entry("b", Some(hours_ago(now, 50)))];

    assert_eq!(filter_recent(entries.clone(), 48, now).len(), 1);
    assert_eq!(filter_recent(entries, 72, now).len(), 2);
}

#[test]
fn test_recency_huge_window_keeps_dated_entries() {
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let entries = vec![
        entry("ancient", Some(Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap())),
        entry("undated", None),
        entry("fresh", Some(hours_ago(now, 1))),
    ];

    for window in [9_000_000_000_000_000, i64::MAX] {
        let kept: Vec<String> = filter_recent(entries.clone(), window, now).into_iter().map(|e| e.link).collect();
        assert_eq!(kept, vec!["ancient".to_string(), "fresh".to_string()]);
    }
}

#[test]
fn test_dedupe_drops_near_duplicate_titles() {
    init_tracing();
    let titles = [
        "Parliament votes on budget",
        "Parliament vote on the budget",
        "Storm hits the northern coast",
        "Central bank holds interest rates",
        "Ukraine and Poland sign grain deal",
    ];
    let articles: Vec<Article> = titles
        .iter()
        .enumerate()
        .map(|(i, t)| article(t, &format!("https://n.example/{i}"), "poland"))
        .collect();

    let unique = Deduplicator::default().dedupe(articles);

    let kept: Vec<&str> = unique.iter().map(|a| a.title.as_str()).collect();
    assert_eq!(
        kept,
        vec![
            "Parliament votes on budget",
            "Storm hits the northern coast",
            "Central bank holds interest rates",
            "Ukraine and Poland sign grain deal",
        ]
    );
}

#[test]
fn test_dedupe_is_idempotent() {
    let articles = vec![
        article("Budget passes in Sejm", "https://n.example/1", "poland"),
        article("Budget passes in the Sejm", "https://n.example/2", "poland"),
        article("Flooding in Limburg", "https://n.example/3", "netherlands"),
    ];
    let dedupe = Deduplicator::default();

    let once = dedupe.dedupe(articles);
    let twice = dedupe.dedupe(once.clone());

    assert_eq!(once.len(), 2);
    assert_eq!(once, twice);
}

#[test]
fn test_dedupe_threshold_is_exclusive() {
    // "abcd" vs "abce": 2 * 3 / 8 = 0.75
    let articles = vec![
        article("abcd", "https://n.example/1", "usa"),
        article("abce", "https://n.example/2", "usa"),
    ];

    assert_eq!(Deduplicator::new(0.75).dedupe(articles.clone()).len(), 2);
    assert_eq!(Deduplicator::new(0.74).dedupe(articles).len(), 1);
}

#[test]
fn test_default_threshold_keeps_exact_point_eight() {
    // "abcde" vs "abcdf": 2 * 4 / 10 = 0.8
    let articles = vec![
        article("abcde", "https://n.example/1", "usa"),
        article("abcdf", "https://n.example/2", "usa"),
    ];

    assert_eq!(Deduplicator::default().dedupe(articles).len(), 2);
}

#[test]
fn test_dedupe_empty_input() {
    assert!(Deduplicator::default().dedupe(Vec::new()).is_empty());
}

fn dated(title: &str, category: &str, hours: i64) -> Article {
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    article(title, &format!("https://n.example/{title}"), category).with_pub_date(Some(hours_ago(now, hours)))
}

#[test]
fn test_quota_keeps_newest_per_category() {
    init_tracing();
    let quotas = HashMap::from([("poland".to_string(), 2), ("usa".to_string(), 1)]);
    let selector = CategorySelector::new(
        vec!["poland".to_string(), "usa".to_string(), "ukraine".to_string()],
        SelectionPolicy::Quota,
        quotas,
        10,
    );
    let articles = vec![
        dated("pl-old", "poland", 20),
        dated("us-1", "usa", 3),
        dated("pl-new", "poland", 1),
        article("pl-undated", "https://n.example/u", "poland"),
        dated("pl-mid", "poland", 5),
        dated("ua-1", "ukraine", 2),
        dated("us-2", "usa", 1),
    ];

    let selection = selector.select(articles);

    let titles: Vec<&str> = selection.articles.iter().map(|a| a.title.as_str()).collect();
    // ukraine has no quota, so contributes nothing
    assert_eq!(titles, vec!["pl-new", "pl-mid", "us-2"]);
    assert_eq!(selection.category_count, 2);
}

#[test]
fn test_pass_through_applies_allow_list() {
    let selector = CategorySelector::new(
        vec!["usa".to_string(), "poland".to_string()],
        SelectionPolicy::PassThrough,
        HashMap::new(),
        10,
    );
    let mut sports = article("Cup final", "https://n.example/s", "sports");
    sports.source = "Sports feed".to_string();
    let articles = vec![
        article("pl-1", "https://n.example/1", "poland"),
        sports,
        article("us-1", "https://n.example/2", "usa"),
        article("pl-2", "https://n.example/3", "poland"),
    ];

    let selection = selector.select(articles);

    let titles: Vec<&str> = selection.articles.iter().map(|a| a.title.as_str()).collect();
    assert_eq!(titles, vec!["us-1", "pl-1", "pl-2"]);
    assert_eq!(selection.category_count, 2);
    assert_eq!(selection.feed_count, 1);
}
