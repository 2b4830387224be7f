use crate::similarity::similarity_ratio;
use crate::types::Article;
use tracing::{debug, info, warn};

/// Titles more similar than this are treated as the same story.
pub const SIMILARITY_THRESHOLD: f64 = 0.80;

/// Drop near-duplicate articles, keeping the first occurrence.
pub struct Deduplicator {
    threshold: f64,
}

impl Default for Deduplicator {
    fn default() -> Self {
        Self {
            threshold: SIMILARITY_THRESHOLD,
        }
    }
}

impl Deduplicator {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn dedupe(&self, articles: Vec<Article>) -> Vec<Article> {
        if articles.is_empty() {
            warn!("No articles to deduplicate");
            return articles;
        }

        let total = articles.len();
        let mut accepted_keys: Vec<String> = Vec::with_capacity(total);
        let mut unique = Vec::with_capacity(total);

        for article in articles {
            let key = article.dedupe_key();
            let duplicate_of = accepted_keys
                .iter()
                .find(|seen| similarity_ratio(&key, seen) > self.threshold);

            match duplicate_of {
                Some(seen) => {
                    debug!("Dropping near-duplicate \"{}\" (matches \"{}\")", key, seen);
                }
                None => {
                    accepted_keys.push(key);
                    unique.push(article);
                }
            }
        }

        info!("Deduplicated corpus: {} unique from {} total", unique.len(), total);
        unique
    }
}
