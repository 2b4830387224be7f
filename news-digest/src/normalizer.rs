use crate::extractor::ContentExtractor;
use crate::translate::Translator;
use crate::types::{Article, FeedSource, NormalizationError, RawEntry};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Extracted page text longer than this many characters is discarded in
/// favour of the feed description.
pub const MAX_EXTRACTED_CHARS: usize = 10 * 1024;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationMode {
    /// Title and summary translated together as one unit.
    #[default]
    Minimal,
    /// Optional full-text extraction; title and body translated separately.
    Extended,
}

/// Turns raw feed entries into validated `Article`s.
pub struct ContentNormalizer {
    mode: NormalizationMode,
    translator: Arc<dyn Translator>,
    extractor: Option<Arc<dyn ContentExtractor>>,
    max_extracted_chars: usize,
}

impl ContentNormalizer {
    pub fn new(mode: NormalizationMode, translator: Arc<dyn Translator>) -> Self {
        Self {
            mode,
            translator,
            extractor: None,
            max_extracted_chars: MAX_EXTRACTED_CHARS,
        }
    }

    /// Only consulted in extended mode.
    pub fn with_extractor(mut self, extractor: Arc<dyn ContentExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    pub fn with_max_extracted_chars(mut self, max_extracted_chars: usize) -> Self {
        self.max_extracted_chars = max_extracted_chars;
        self
    }

    pub fn mode(&self) -> NormalizationMode {
        self.mode
    }

    pub async fn normalize(&self, entry: &RawEntry, feed: &FeedSource) -> Result<Article, NormalizationError> {
        let (title, content) = match self.mode {
            NormalizationMode::Minimal => self.translate_joined(entry).await?,
            NormalizationMode::Extended => {
                let body = self.body_for(entry).await;
                let title = self.translator.translate(&entry.title).await?;
                let content = self.translator.translate(&body).await?;
                (title, content)
            }
        };

        let article = Article::new(title, content, entry.link.as_str(), feed.category.as_str(), feed.name.as_str())?
            .with_pub_date(entry.published)
            .with_image_url(entry.image_url.clone());

        debug!("Normalized article from {}: {}", feed.name, entry.link);
        Ok(article)
    }

    async fn translate_joined(&self, entry: &RawEntry) -> Result<(String, String), NormalizationError> {
        let joined = join_text(&entry.title, &entry.summary);
        let translated = self.translator.translate(&joined).await?;
        Ok(split_text(&translated))
    }

    /// Extracted page text when it is usable, the feed description otherwise.
    async fn body_for(&self, entry: &RawEntry) -> String {
        let description = entry.description().to_string();
        let Some(extractor) = &self.extractor else {
            return description;
        };

        match extractor.extract(&entry.link).await {
            Ok(text) if text.chars().count() > self.max_extracted_chars => {
                warn!(
                    "Extracted text too large ({} chars > {}): {}",
                    text.chars().count(),
                    self.max_extracted_chars,
                    entry.link
                );
                description
            }
            Ok(text) if text.trim().is_empty() => description,
            Ok(text) => text,
            Err(e) => {
                warn!("Extraction failed for {}: {}; using feed description", entry.link, e);
                description
            }
        }
    }
}

fn join_text(title: &str, body: &str) -> String {
    match (title.trim().is_empty(), body.trim().is_empty()) {
        (false, false) => format!("{}\n\n{}", title, body),
        (false, true) => title.to_string(),
        _ => body.to_string(),
    }
}

/// Split translated text back at its first blank line.
fn split_text(text: &str) -> (String, String) {
    match text.split_once("\n\n") {
        Some((title, content)) => (title.trim().to_string(), content.trim().to_string()),
        None => (text.trim().to_string(), String::new()),
    }
}
