use crate::parser::{force_utf8, FeedParser};
use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::types::{FeedBody, FeedSource, FetchConfig, FetchError, RawEntry};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use tracing::{debug, error, info};

/// The network side of feed fetching; swapped for fakes in tests.
#[async_trait]
pub trait FeedTransport: Send + Sync {
    async fn get(&self, url: &str) -> Result<FeedBody, FetchError>;
}

/// reqwest-backed transport.
pub struct HttpFeedTransport {
    client: Client,
}

impl HttpFeedTransport {
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()
            .map_err(|e| FetchError::Transport {
                url: String::new(),
                message: format!("cannot build HTTP client: {}", e),
            })?;

        Ok(Self { client })
    }

    /// Fetch a page as text (used for full-text extraction).
    pub async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await.map_err(|e| FetchError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| FetchError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl FeedTransport for HttpFeedTransport {
    async fn get(&self, url: &str) -> Result<FeedBody, FetchError> {
        let response = self.client.get(url).send().await.map_err(|e| FetchError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let declared_charset = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|ct| {
                ct.split(';')
                    .map(str::trim)
                    .find_map(|part| part.strip_prefix("charset="))
                    .map(|cs| cs.trim_matches('"').to_string())
            });

        let bytes = response.bytes().await.map_err(|e| FetchError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        Ok(FeedBody {
            bytes: bytes.to_vec(),
            declared_charset,
        })
    }
}

/// Fetches and parses one feed with politeness delay and bounded retry.
pub struct Fetcher {
    transport: Arc<dyn FeedTransport>,
    config: FetchConfig,
}

impl Fetcher {
    pub fn new(transport: Arc<dyn FeedTransport>, config: FetchConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    pub async fn fetch_feed(&self, feed: &FeedSource) -> Result<Vec<RawEntry>, FetchError> {
        let policy = RetryPolicy::new(self.config.max_attempts, self.config.retry_delay);

        let result = retry_with_backoff(policy, |attempt| async move {
            if !self.config.politeness_delay.is_zero() {
                tokio::time::sleep(self.config.politeness_delay).await;
            }
            debug!("Fetching feed {} ({}), attempt {}", feed.name, feed.url, attempt);
            self.fetch_once(feed).await
        })
        .await;

        match result {
            Ok(entries) => {
                info!("Fetched {} entries from {}", entries.len(), feed.name);
                Ok(entries)
            }
            Err(exhausted) => {
                error!(
                    "Failed to fetch feed {} after {} attempts: {}",
                    feed.url, exhausted.attempts, exhausted.last
                );
                Err(FetchError::Exhausted {
                    url: feed.url.clone(),
                    attempts: exhausted.attempts,
                    last: Box::new(exhausted.last),
                })
            }
        }
    }

    async fn fetch_once(&self, feed: &FeedSource) -> Result<Vec<RawEntry>, FetchError> {
        let body = self.transport.get(&feed.url).await?;

        let bytes = if feed.force_utf8 {
            debug!(
                "Overriding declared charset {:?} with UTF-8 for {}",
                body.declared_charset, feed.name
            );
            force_utf8(&body.bytes)
        } else {
            body.bytes
        };

        FeedParser::parse(&feed.url, &bytes)
    }
}
