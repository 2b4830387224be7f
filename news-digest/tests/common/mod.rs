// Fakes and fixtures shared by the news-digest integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use email_delivery::{DeliveryError, Mailer, OutgoingEmail};
use news_digest::config::AppConfig;
use news_digest::extractor::ContentExtractor;
use news_digest::llm_adapter::{ChatRequest, ChatTransport};
use news_digest::translate::Translator;
use news_digest::{
    Article, ContentNormalizer, FeedBody, FeedTransport, FetchConfig, FetchError, Fetcher, NormalizationError,
    NormalizationMode, PipelineServices, SummarizationError, Summarizer, SummarizerConfig,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

static TRACING: Once = Once::new();

pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();
    });
}

/// Retry loop without any sleeping.
pub fn fast_fetch_config() -> FetchConfig {
    FetchConfig {
        max_attempts: 3,
        retry_delay: Duration::ZERO,
        politeness_delay: Duration::ZERO,
        ..FetchConfig::default()
    }
}

pub fn hours_ago(now: DateTime<Utc>, hours: i64) -> DateTime<Utc> {
    now - ChronoDuration::hours(hours)
}

/// One `<item>` of an RSS 2.0 document.
pub struct Item<'a> {
    pub title: &'a str,
    pub link: &'a str,
    pub description: &'a str,
    pub published: Option<DateTime<Utc>>,
}

impl<'a> Item<'a> {
    pub fn new(title: &'a str, link: &'a str, published: Option<DateTime<Utc>>) -> Self {
        Self {
            title,
            link,
            description: "Short description.",
            published,
        }
    }
}

pub fn rss_xml(items: &[Item<'_>]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<rss version=\"2.0\">\n<channel>\n\
         <title>Test feed</title>\n<link>https://news.example/</link>\n<description>Test</description>\n",
    );
    for item in items {
        xml.push_str("<item>\n");
        xml.push_str(&format!("<title>{}</title>\n", item.title));
        xml.push_str(&format!("<link>{}</link>\n", item.link));
        xml.push_str(&format!("<description>{}</description>\n", item.description));
        if let Some(published) = item.published {
            xml.push_str(&format!("<pubDate>{}</pubDate>\n", published.to_rfc2822()));
        }
        xml.push_str("</item>\n");
    }
    xml.push_str("</channel>\n</rss>\n");
    xml
}

#[derive(Clone)]
enum FakeFeed {
    Body(Vec<u8>),
    Status(u16),
    /// Fails with a transport error `failures` times, then serves the body.
    Flaky { failures: usize, body: Vec<u8> },
}

/// In-memory feed transport keyed by URL, counting calls per URL.
#[derive(Default)]
pub struct FakeFeedTransport {
    feeds: HashMap<String, FakeFeed>,
    calls: Mutex<HashMap<String, usize>>,
}

impl FakeFeedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_feed(mut self, url: &str, body: impl Into<Vec<u8>>) -> Self {
        self.feeds.insert(url.to_string(), FakeFeed::Body(body.into()));
        self
    }

    pub fn with_status(mut self, url: &str, status: u16) -> Self {
        self.feeds.insert(url.to_string(), FakeFeed::Status(status));
        self
    }

    pub fn with_flaky(mut self, url: &str, failures: usize, body: impl Into<Vec<u8>>) -> Self {
        self.feeds.insert(
            url.to_string(),
            FakeFeed::Flaky {
                failures,
                body: body.into(),
            },
        );
        self
    }

    pub fn calls(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }
}

#[async_trait]
impl FeedTransport for FakeFeedTransport {
    async fn get(&self, url: &str) -> Result<FeedBody, FetchError> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            let count = calls.entry(url.to_string()).or_insert(0);
            *count += 1;
            *count
        };

        match self.feeds.get(url) {
            Some(FakeFeed::Body(body)) => Ok(FeedBody::new(body.clone())),
            Some(FakeFeed::Status(status)) => Err(FetchError::Status {
                url: url.to_string(),
                status: *status,
            }),
            Some(FakeFeed::Flaky { failures, body }) if call > *failures => Ok(FeedBody::new(body.clone())),
            Some(FakeFeed::Flaky { .. }) | None => Err(FetchError::Transport {
                url: url.to_string(),
                message: "connection refused".to_string(),
            }),
        }
    }
}

/// Chat transport returning a canned reply (or error) and recording requests.
pub struct FakeChat {
    reply: Result<String, u16>,
    requests: Mutex<Vec<(String, ChatRequest)>>,
}

impl FakeChat {
    pub fn replying(content: impl Into<String>) -> Self {
        Self {
            reply: Ok(content.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            reply: Err(status),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<(String, ChatRequest)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatTransport for FakeChat {
    async fn complete(&self, api_key: &str, request: &ChatRequest) -> Result<String, SummarizationError> {
        self.requests
            .lock()
            .unwrap()
            .push((api_key.to_string(), request.clone()));
        match &self.reply {
            Ok(content) => Ok(content.clone()),
            Err(status) => Err(SummarizationError::Status {
                status: *status,
                body: "upstream error".to_string(),
            }),
        }
    }
}

/// Tags text so tests can see it went through translation.
pub struct TaggingTranslator;

#[async_trait]
impl Translator for TaggingTranslator {
    async fn translate(&self, text: &str) -> Result<String, NormalizationError> {
        Ok(text
            .split("\n\n")
            .map(|part| format!("[en] {}", part))
            .collect::<Vec<_>>()
            .join("\n\n"))
    }
}

/// Refuses any text containing "untranslatable".
pub struct PickyTranslator;

#[async_trait]
impl Translator for PickyTranslator {
    async fn translate(&self, text: &str) -> Result<String, NormalizationError> {
        if text.contains("untranslatable") {
            Err(NormalizationError::Translation("model refused".to_string()))
        } else {
            Ok(text.to_string())
        }
    }
}

pub struct FakeExtractor {
    result: Result<String, String>,
}

impl FakeExtractor {
    pub fn returning(text: impl Into<String>) -> Self {
        Self { result: Ok(text.into()) }
    }

    pub fn failing() -> Self {
        Self {
            result: Err("page unavailable".to_string()),
        }
    }
}

#[async_trait]
impl ContentExtractor for FakeExtractor {
    async fn extract(&self, _url: &str) -> Result<String, NormalizationError> {
        self.result.clone().map_err(NormalizationError::Extraction)
    }
}

/// Records every email instead of sending it.
#[derive(Default)]
pub struct FakeMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
    fail: bool,
}

impl FakeMailer {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for FakeMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), DeliveryError> {
        self.sent.lock().unwrap().push(email.clone());
        if self.fail {
            Err(DeliveryError::Smtp("535 authentication failed".to_string()))
        } else {
            Ok(())
        }
    }
}

pub fn article(title: &str, url: &str, category: &str) -> Article {
    Article::new(title, "", url, category, "Test feed").unwrap()
}

pub const STORIES_REPLY: &str = r#"{"stories": [
    {"overview": "Sejm passes the 2025 budget", "highlights": ["Vote was 240 to 200"], "urls": ["https://a.example/1"]},
    {"overview": "Dutch coalition talks resume", "highlights": ["Talks restart Monday"], "url": "https://b.example/1"}
], "total_articles": 3, "sources": 2}"#;

/// Services wired to fakes; no network, no sleeping.
pub fn fake_services(
    transport: Arc<FakeFeedTransport>,
    chat: Arc<FakeChat>,
    mailer: Arc<FakeMailer>,
    api_key: Option<&str>,
) -> PipelineServices {
    PipelineServices {
        fetcher: Fetcher::new(transport, fast_fetch_config()),
        normalizer: ContentNormalizer::new(NormalizationMode::Minimal, Arc::new(news_digest::translate::IdentityTranslator)),
        summarizer: Summarizer::new(chat, api_key.map(str::to_string), SummarizerConfig::new("test-model")),
        mailer,
    }
}

pub fn two_feed_config() -> AppConfig {
    AppConfig::from_yaml_str(
        r#"
rss_feeds:
  - { name: "Feed A", url: "https://a.example/rss", category: poland }
  - { name: "Feed B", url: "https://b.example/rss", category: netherlands }
llm_model: test-model
recipients: ["reader@example.com"]
selection:
  policy: pass_through
summary:
  cache_path: null
"#,
    )
    .unwrap()
}
