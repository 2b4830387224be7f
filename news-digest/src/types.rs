use chrono::{DateTime, Utc};
use email_delivery::DeliveryError;
use interfaces::ValidationError;
use std::time::Duration;

pub use interfaces::{Article, FeedSource, Story, SummaryResult};

/// Knobs for the feed transport and its retry loop.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout: Duration,
    pub max_attempts: u32,
    pub retry_delay: Duration,
    /// Slept before every attempt, whether or not it is a retry.
    pub politeness_delay: Duration,
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "news-digest/0.1".to_string(),
            timeout: Duration::from_secs(30),
            max_attempts: 3,
            retry_delay: Duration::from_secs(1),
            politeness_delay: Duration::from_secs(1),
            max_redirects: 5,
        }
    }
}

/// Body returned by a feed transport before parsing.
#[derive(Debug, Clone)]
pub struct FeedBody {
    pub bytes: Vec<u8>,
    /// Charset from the transport's Content-Type header, if any.
    pub declared_charset: Option<String>,
}

impl FeedBody {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            declared_charset: None,
        }
    }
}

/// One feed entry as the parser produced it. Discarded once normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEntry {
    pub title: String,
    pub summary: String,
    pub link: String,
    pub published: Option<DateTime<Utc>>,
    /// Full-text body carried by the feed itself (`content:encoded` and friends).
    pub content: Option<String>,
    pub image_url: Option<String>,
}

impl RawEntry {
    /// The best description the feed offers: full content first, then summary.
    pub fn description(&self) -> &str {
        match self.content.as_deref() {
            Some(content) if !content.trim().is_empty() => content,
            _ => &self.summary,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("missing environment variables: {}", .0.join(", "))]
    MissingEnv(Vec<String>),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("malformed feed {url}: {diagnostic}")]
    Malformed { url: String, diagnostic: String },

    #[error("giving up on {url} after {attempts} attempts: {last}")]
    Exhausted {
        url: String,
        attempts: u32,
        last: Box<FetchError>,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum NormalizationError {
    #[error("translation failed: {0}")]
    Translation(String),

    #[error("content extraction failed: {0}")]
    Extraction(String),

    #[error("invalid article: {0}")]
    Validation(#[from] ValidationError),
}

#[derive(Debug, thiserror::Error)]
pub enum SummarizationError {
    #[error("LLM request failed: {0}")]
    Transport(String),

    #[error("LLM endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("LLM response could not be parsed: {0}")]
    Parse(String),
}

/// Failures that end a run. Everything per-feed or per-article is handled
/// where it happens and never reaches this type.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("all {feeds} feeds failed to fetch")]
    AllFeedsFailed { feeds: usize },

    #[error("delivery failed: {0}")]
    Delivery(#[from] DeliveryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RunError {
    pub fn exit_code(&self) -> i32 {
        match self {
            RunError::Config(_) => 2,
            RunError::AllFeedsFailed { .. } => 3,
            RunError::Delivery(_) => 5,
            RunError::Io(_) => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, RunError>;
