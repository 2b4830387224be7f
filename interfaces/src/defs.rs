use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A configured RSS/Atom source. One per entry in `rss_feeds`; immutable for the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSource {
    pub name: String,
    pub url: String,
    pub category: String,
    /// Ignore the transport-declared encoding and treat the body as UTF-8.
    #[serde(default)]
    pub force_utf8: bool,
}

impl FeedSource {
    pub fn new(name: impl Into<String>, url: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            category: category.into(),
            force_utf8: false,
        }
    }

    pub fn with_force_utf8(mut self, force_utf8: bool) -> Self {
        self.force_utf8 = force_utf8;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("field `{0}` must not be empty")]
    EmptyField(&'static str),

    #[error("article has neither a title nor content")]
    NoText,
}

/// The canonical unit flowing through the pipeline.
///
/// `text()` gives the minimal `title + "\n\n" + body` rendition used for
/// prompts and similarity when no title is available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub content: String,
    pub url: String,
    pub category: String,
    /// Name of the feed the article came from.
    pub source: String,
    pub pub_date: Option<DateTime<Utc>>,
    pub image_url: Option<String>,
}

impl Article {
    /// Build an article, checking required fields up front.
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        url: impl Into<String>,
        category: impl Into<String>,
        source: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let title = title.into().trim().to_string();
        let content = content.into().trim().to_string();
        let url = url.into().trim().to_string();
        let category = category.into().trim().to_string();

        if url.is_empty() {
            return Err(ValidationError::EmptyField("url"));
        }
        if category.is_empty() {
            return Err(ValidationError::EmptyField("category"));
        }
        if title.is_empty() && content.is_empty() {
            return Err(ValidationError::NoText);
        }

        Ok(Self {
            title,
            content,
            url,
            category,
            source: source.into(),
            pub_date: None,
            image_url: None,
        })
    }

    pub fn with_pub_date(mut self, pub_date: Option<DateTime<Utc>>) -> Self {
        self.pub_date = pub_date;
        self
    }

    pub fn with_image_url(mut self, image_url: Option<String>) -> Self {
        self.image_url = image_url.filter(|u| !u.trim().is_empty());
        self
    }

    pub fn text(&self) -> String {
        match (self.title.is_empty(), self.content.is_empty()) {
            (_, true) => self.title.clone(),
            (true, false) => self.content.clone(),
            (false, false) => format!("{}\n\n{}", self.title, self.content),
        }
    }

    /// String compared when looking for near-duplicates.
    pub fn dedupe_key(&self) -> String {
        if self.title.is_empty() {
            self.text()
        } else {
            self.title.clone()
        }
    }
}

/// One story selected and summarized by the LLM.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub highlights: Vec<String>,
    #[serde(default, alias = "url", deserialize_with = "one_or_many")]
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(url)) if url.trim().is_empty() => Vec::new(),
        Some(OneOrMany::One(url)) => vec![url],
        Some(OneOrMany::Many(urls)) => urls,
    })
}

/// The contract object handed to email rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryResult {
    #[serde(default, alias = "top5")]
    pub stories: Vec<Story>,
    #[serde(default)]
    pub total_articles: usize,
    #[serde(default)]
    pub sources: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

impl SummaryResult {
    /// Result for an empty corpus.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Result used when the LLM could not be asked or did not answer usefully.
    pub fn degraded(total_articles: usize) -> Self {
        Self {
            total_articles,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.stories.is_empty()
    }
}
