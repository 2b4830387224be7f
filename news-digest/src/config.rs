use crate::llm_adapter::OPENROUTER_URL;
use crate::normalizer::{NormalizationMode, MAX_EXTRACTED_CHARS};
use crate::recency::DEFAULT_WINDOW_HOURS;
use crate::selector::SelectionPolicy;
use crate::summarizer::DEFAULT_TEMPERATURE;
use crate::types::{ConfigError, FeedSource, FetchConfig};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;
use url::Url;

pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Ten years; anything wider is a typo.
pub const MAX_RECENCY_HOURS: i64 = 24 * 365 * 10;

/// Contents of `config.yaml`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub rss_feeds: Vec<FeedSource>,
    pub llm_model: String,
    pub recipients: Vec<String>,
    #[serde(default = "default_subject")]
    pub email_subject: String,
    /// Allow-list for selection; empty means "every feed category".
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default = "default_recency_hours")]
    pub recency_hours: i64,
    #[serde(default)]
    pub selection: SelectionConfig,
    #[serde(default)]
    pub normalization: NormalizationConfig,
    #[serde(default)]
    pub summary: SummaryConfig,
    #[serde(default)]
    pub fetch: FetchSettings,
    #[serde(default)]
    pub email: EmailSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Unset means quota when quotas are configured, pass-through otherwise.
    pub policy: Option<SelectionPolicy>,
    pub quotas: HashMap<String, usize>,
    pub min_articles: usize,
    /// Recent entries normalized per feed; unlimited when unset.
    pub per_feed_limit: Option<usize>,
}

impl SelectionConfig {
    pub fn policy(&self) -> SelectionPolicy {
        match self.policy {
            Some(policy) => policy,
            None if self.quotas.is_empty() => SelectionPolicy::PassThrough,
            None => SelectionPolicy::Quota,
        }
    }
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            policy: None,
            quotas: HashMap::new(),
            min_articles: 10,
            per_feed_limit: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NormalizationConfig {
    pub mode: NormalizationMode,
    /// No translation when unset.
    pub target_language: Option<String>,
    /// Extracted text longer than this many characters is discarded.
    #[serde(alias = "max_extracted_bytes")]
    pub max_extracted_chars: usize,
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            mode: NormalizationMode::default(),
            target_language: None,
            max_extracted_chars: MAX_EXTRACTED_CHARS,
        }
    }
}

/// Which figure the email reports as "N sources".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceCount {
    #[default]
    Categories,
    Feeds,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    pub story_mix: HashMap<String, usize>,
    pub endpoint: String,
    pub temperature: f32,
    pub timeout_secs: u64,
    pub cache_path: Option<PathBuf>,
    pub source_count: SourceCount,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            story_mix: HashMap::new(),
            endpoint: OPENROUTER_URL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            timeout_secs: 60,
            cache_path: Some(PathBuf::from("cache.json")),
            source_count: SourceCount::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    pub max_attempts: u32,
    pub retry_delay_secs: u64,
    pub politeness_delay_secs: u64,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        let defaults = FetchConfig::default();
        Self {
            max_attempts: defaults.max_attempts,
            retry_delay_secs: defaults.retry_delay.as_secs(),
            politeness_delay_secs: defaults.politeness_delay.as_secs(),
            timeout_secs: defaults.timeout.as_secs(),
            user_agent: defaults.user_agent,
        }
    }
}

impl FetchSettings {
    pub fn to_fetch_config(&self) -> FetchConfig {
        FetchConfig {
            user_agent: self.user_agent.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            max_attempts: self.max_attempts,
            retry_delay: Duration::from_secs(self.retry_delay_secs),
            politeness_delay: Duration::from_secs(self.politeness_delay_secs),
            ..FetchConfig::default()
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmailSettings {
    pub smtp_host: String,
    pub smtp_port: u16,
    /// Send the story-less email when summarization fell back.
    pub send_degraded: bool,
    /// Where `--dry-run` writes the rendered email.
    pub output_path: PathBuf,
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            send_degraded: true,
            output_path: PathBuf::from("email.html"),
        }
    }
}

fn default_subject() -> String {
    "Top stories: {date}".to_string()
}

fn default_recency_hours() -> i64 {
    DEFAULT_WINDOW_HOURS
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        debug!("Loaded config from {}", path.display());
        Self::from_yaml_str(&raw)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = serde_yaml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rss_feeds.is_empty() {
            return Err(ConfigError::Invalid("at least one entry in rss_feeds is required".into()));
        }
        for (i, feed) in self.rss_feeds.iter().enumerate() {
            if feed.name.trim().is_empty() || feed.category.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "rss_feeds[{}] needs a non-empty name and category",
                    i
                )));
            }
            Url::parse(&feed.url).map_err(|e| {
                ConfigError::Invalid(format!("rss_feeds[{}] has an invalid url {:?}: {}", i, feed.url, e))
            })?;
        }
        if self.llm_model.trim().is_empty() {
            return Err(ConfigError::Invalid("llm_model must not be empty".into()));
        }
        if self.recency_hours <= 0 || self.recency_hours > MAX_RECENCY_HOURS {
            return Err(ConfigError::Invalid(format!(
                "recency_hours must be between 1 and {}",
                MAX_RECENCY_HOURS
            )));
        }
        if self.fetch.max_attempts == 0 {
            return Err(ConfigError::Invalid("fetch.max_attempts must be at least 1".into()));
        }
        if self.selection.policy == Some(SelectionPolicy::Quota) && self.selection.quotas.is_empty() {
            return Err(ConfigError::Invalid(
                "selection.policy quota needs at least one entry in selection.quotas".into(),
            ));
        }
        Ok(())
    }

    /// The configured allow-list, or the feed categories in configuration order.
    pub fn allowed_categories(&self) -> Vec<String> {
        if !self.categories.is_empty() {
            return self.categories.clone();
        }
        let mut categories: Vec<String> = Vec::new();
        for feed in &self.rss_feeds {
            if !categories.contains(&feed.category) {
                categories.push(feed.category.clone());
            }
        }
        categories
    }

    /// `summary.story_mix` ordered like the allow-list, leftovers sorted by name.
    pub fn story_mix(&self) -> Vec<(String, usize)> {
        let mut mix: Vec<(String, usize)> = self
            .allowed_categories()
            .into_iter()
            .filter_map(|c| self.summary.story_mix.get(&c).map(|n| (c, *n)))
            .collect();

        let mut rest: Vec<(String, usize)> = self
            .summary
            .story_mix
            .iter()
            .filter(|(c, _)| !mix.iter().any(|(known, _)| known == *c))
            .map(|(c, n)| (c.clone(), *n))
            .collect();
        rest.sort();
        mix.extend(rest);
        mix
    }

    pub fn subject_for(&self, date: &str) -> String {
        self.email_subject.replace("{date}", date)
    }
}

pub const ENV_TRANSLATION_API_KEY: &str = "TRANSLATION_API_KEY";
pub const ENV_OPENROUTER_API_KEY: &str = "OPENROUTER_API_KEY";
pub const ENV_EMAIL_SENDER: &str = "EMAIL_SENDER";
pub const ENV_EMAIL_APP_PASSWORD: &str = "EMAIL_APP_PASSWORD";

/// Secrets taken from the environment.
#[derive(Clone)]
pub struct Env {
    pub translation_api_key: String,
    pub openrouter_api_key: String,
    pub email_sender: String,
    pub email_app_password: String,
}

impl std::fmt::Debug for Env {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Env")
            .field("email_sender", &self.email_sender)
            .finish_non_exhaustive()
    }
}

impl Env {
    /// Read the process environment after loading `.env`, if there is one.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Every variable is required; the error names all that are missing or empty.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut missing = Vec::new();
        let mut get = |name: &str| match lookup(name).filter(|v| !v.trim().is_empty()) {
            Some(value) => value,
            None => {
                missing.push(name.to_string());
                String::new()
            }
        };

        let env = Self {
            translation_api_key: get(ENV_TRANSLATION_API_KEY),
            openrouter_api_key: get(ENV_OPENROUTER_API_KEY),
            email_sender: get(ENV_EMAIL_SENDER),
            email_app_password: get(ENV_EMAIL_APP_PASSWORD),
        };

        if missing.is_empty() {
            Ok(env)
        } else {
            Err(ConfigError::MissingEnv(missing))
        }
    }
}
