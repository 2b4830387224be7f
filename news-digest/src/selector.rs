use crate::types::Article;
use serde::Deserialize;
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Newest K articles per category.
    #[default]
    Quota,
    /// Every article of every recognized category.
    PassThrough,
}

/// The balanced corpus plus the two "sources" figures the email can show.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub articles: Vec<Article>,
    /// Distinct categories that contributed at least one article.
    pub category_count: usize,
    /// Distinct feeds that contributed at least one article.
    pub feed_count: usize,
}

pub struct CategorySelector {
    categories: Vec<String>,
    policy: SelectionPolicy,
    quotas: HashMap<String, usize>,
    min_articles: usize,
}

impl CategorySelector {
    /// `categories` is the allow-list; its order is the output order.
    pub fn new(
        categories: Vec<String>,
        policy: SelectionPolicy,
        quotas: HashMap<String, usize>,
        min_articles: usize,
    ) -> Self {
        Self {
            categories,
            policy,
            quotas,
            min_articles,
        }
    }

    pub fn select(&self, articles: Vec<Article>) -> Selection {
        let mut by_category: HashMap<String, Vec<Article>> = HashMap::new();
        for article in articles {
            by_category.entry(article.category.clone()).or_default().push(article);
        }

        for (category, group) in &by_category {
            if !self.categories.contains(category) {
                warn!(
                    "Ignoring {} articles from unrecognized category '{}'",
                    group.len(),
                    category
                );
            }
        }

        let mut selected = Vec::new();
        let mut categories_used = 0;

        for category in &self.categories {
            let Some(mut group) = by_category.remove(category) else {
                continue;
            };

            if self.policy == SelectionPolicy::Quota {
                let cap = self.quotas.get(category).copied().unwrap_or(0);
                // newest first, undated last; stable for equal dates
                group.sort_by_key(|a| Reverse(a.pub_date));
                group.truncate(cap);
            }

            debug!("Selected {} articles for category '{}'", group.len(), category);
            if !group.is_empty() {
                categories_used += 1;
            }
            selected.extend(group);
        }

        if selected.len() < self.min_articles {
            warn!(
                "Only {} articles selected, less than {}",
                selected.len(),
                self.min_articles
            );
        }

        let feed_count = selected
            .iter()
            .map(|a| a.source.as_str())
            .collect::<HashSet<_>>()
            .len();

        info!(
            "Selected {} articles from {} categories ({} feeds)",
            selected.len(),
            categories_used,
            feed_count
        );

        Selection {
            articles: selected,
            category_count: categories_used,
            feed_count,
        }
    }
}
