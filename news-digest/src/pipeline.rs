use crate::config::{AppConfig, Env, SourceCount};
use crate::dedupe::Deduplicator;
use crate::extractor::HtmlExtractor;
use crate::fetcher::{Fetcher, HttpFeedTransport};
use crate::llm_adapter::{ChatTransport, OpenRouterClient};
use crate::normalizer::{ContentNormalizer, NormalizationMode};
use crate::recency::filter_recent;
use crate::selector::{CategorySelector, Selection};
use crate::summarizer::{Summarizer, SummarizerConfig, SummaryOutcome};
use crate::translate::{ChatTranslator, IdentityTranslator, Translator};
use crate::types::{Article, ConfigError, FeedSource, RawEntry, Result, RunError};
use chrono::{DateTime, Local, Utc};
use email_delivery::{render_email, EmailContext, Mailer, OutgoingEmail, SmtpConfig, SmtpMailer};
use futures::future::join_all;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// How a run ended when it did not fail outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Email submitted over SMTP.
    Delivered,
    /// Email written to disk instead of sent.
    DryRun,
    /// No article survived normalization; nothing rendered.
    NothingToSend,
    /// Summarization fell back and degraded emails are disabled.
    SkippedDegraded,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: Uuid,
    pub status: RunStatus,
    pub feeds_ok: usize,
    pub feeds_failed: usize,
    /// Articles after normalization, before deduplication.
    pub articles: usize,
    /// Articles handed to the summarizer.
    pub selected: usize,
    pub stories: usize,
    pub degraded: bool,
    pub output_path: Option<PathBuf>,
}

impl RunReport {
    fn new(run_id: Uuid, status: RunStatus) -> Self {
        Self {
            run_id,
            status,
            feeds_ok: 0,
            feeds_failed: 0,
            articles: 0,
            selected: 0,
            stories: 0,
            degraded: false,
            output_path: None,
        }
    }

    /// Process exit status for a run that did not error.
    pub fn exit_code(&self) -> i32 {
        if self.degraded {
            4
        } else {
            0
        }
    }
}

/// Called once at the top level when a run fails.
pub trait AlertHook: Send + Sync {
    fn alert(&self, run_id: Uuid, error: &RunError);
}

/// Default hook: an error log line carrying the run id and exit code.
pub struct LogAlertHook;

impl AlertHook for LogAlertHook {
    fn alert(&self, run_id: Uuid, error: &RunError) {
        error!(%run_id, exit_code = error.exit_code(), "Daily digest run failed: {}", error);
    }
}

/// The external collaborators of a run.
pub struct PipelineServices {
    pub fetcher: Fetcher,
    pub normalizer: ContentNormalizer,
    pub summarizer: Summarizer,
    pub mailer: Arc<dyn Mailer>,
}

impl PipelineServices {
    /// HTTP, LLM and SMTP clients built from configuration and secrets.
    pub fn production(config: &AppConfig, env: &Env) -> std::result::Result<Self, ConfigError> {
        let fetch_config = config.fetch.to_fetch_config();
        let http = Arc::new(
            HttpFeedTransport::new(&fetch_config).map_err(|e| ConfigError::Invalid(e.to_string()))?,
        );

        let llm: Arc<dyn ChatTransport> = Arc::new(
            OpenRouterClient::new(
                config.summary.endpoint.as_str(),
                Duration::from_secs(config.summary.timeout_secs),
            )
            .map_err(|e| ConfigError::Invalid(e.to_string()))?,
        );

        let translator: Arc<dyn Translator> = match &config.normalization.target_language {
            Some(language) => Arc::new(ChatTranslator::new(
                llm.clone(),
                env.translation_api_key.as_str(),
                config.llm_model.as_str(),
                language.as_str(),
            )),
            None => Arc::new(IdentityTranslator),
        };

        let mut normalizer = ContentNormalizer::new(config.normalization.mode, translator)
            .with_max_extracted_chars(config.normalization.max_extracted_chars);
        if config.normalization.mode == NormalizationMode::Extended {
            normalizer = normalizer.with_extractor(Arc::new(HtmlExtractor::new(http.clone())));
        }

        let summarizer = Summarizer::new(
            llm,
            Some(env.openrouter_api_key.clone()),
            SummarizerConfig {
                model: config.llm_model.clone(),
                temperature: config.summary.temperature,
                cache_path: config.summary.cache_path.clone(),
                story_mix: config.story_mix(),
            },
        );

        let mailer = Arc::new(SmtpMailer::new(SmtpConfig {
            host: config.email.smtp_host.clone(),
            port: config.email.smtp_port,
            sender: env.email_sender.clone(),
            password: env.email_app_password.clone(),
        }));

        Ok(Self {
            fetcher: Fetcher::new(http, fetch_config),
            normalizer,
            summarizer,
            mailer,
        })
    }
}

/// One end-to-end digest run: fetch, filter, normalize, dedupe, select,
/// summarize, render, deliver.
pub struct DigestPipeline {
    run_id: Uuid,
    config: AppConfig,
    services: PipelineServices,
    deduplicator: Deduplicator,
    selector: CategorySelector,
}

impl DigestPipeline {
    pub fn new(config: AppConfig, services: PipelineServices) -> Self {
        if config.selection.policy.is_none() && config.selection.quotas.is_empty() {
            warn!("No selection.quotas configured; every recognized category passes through");
        }
        let selector = CategorySelector::new(
            config.allowed_categories(),
            config.selection.policy(),
            config.selection.quotas.clone(),
            config.selection.min_articles,
        );

        Self {
            run_id: Uuid::new_v4(),
            config,
            services,
            deduplicator: Deduplicator::default(),
            selector,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Use a run id minted by the caller, so failures before the run share it.
    pub fn with_run_id(mut self, run_id: Uuid) -> Self {
        self.run_id = run_id;
        self
    }

    /// Override where a dry run writes the email.
    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.email.output_path = path.into();
        self
    }

    pub async fn run(&self, dry_run: bool) -> Result<RunReport> {
        self.run_at(dry_run, Utc::now()).await
    }

    /// Run with an explicit "now" for the recency window.
    pub async fn run_at(&self, dry_run: bool, now: DateTime<Utc>) -> Result<RunReport> {
        let span = info_span!("digest_run", run_id = %self.run_id, dry_run);
        self.execute(dry_run, now).instrument(span).await
    }

    async fn execute(&self, dry_run: bool, now: DateTime<Utc>) -> Result<RunReport> {
        let feeds = &self.config.rss_feeds;
        info!("Fetching {} RSS feeds", feeds.len());

        let results = join_all(feeds.iter().map(|feed| self.services.fetcher.fetch_feed(feed))).await;

        let mut report = RunReport::new(self.run_id, RunStatus::NothingToSend);
        let mut fetched = Vec::with_capacity(feeds.len());
        for (feed, result) in feeds.iter().zip(results) {
            match result {
                Ok(entries) => {
                    report.feeds_ok += 1;
                    fetched.push((feed, entries));
                }
                Err(e) => {
                    report.feeds_failed += 1;
                    error!("Failed to fetch feed {}: {}", feed.name, e);
                }
            }
        }
        if fetched.is_empty() {
            return Err(RunError::AllFeedsFailed { feeds: feeds.len() });
        }

        let mut articles = Vec::new();
        for (feed, entries) in fetched {
            articles.extend(self.process_feed(feed, entries, now).await);
        }
        report.articles = articles.len();

        if articles.is_empty() {
            warn!("No articles to process, skipping");
            return Ok(report);
        }

        let unique = self.deduplicator.dedupe(articles);
        let selection = self.selector.select(unique);
        report.selected = selection.articles.len();

        let outcome = self.services.summarizer.summarize(&selection.articles).await;
        report.degraded = outcome.degraded;
        report.stories = outcome.result.stories.len();

        if outcome.degraded && !self.config.email.send_degraded {
            warn!("Summarization degraded; not sending the email");
            report.status = RunStatus::SkippedDegraded;
            return Ok(report);
        }

        let email = self.compose(&outcome, &selection);

        if dry_run {
            let path = self.config.email.output_path.clone();
            tokio::fs::write(&path, &email.html_body).await?;
            info!("Dry run: wrote email to {}", path.display());
            report.status = RunStatus::DryRun;
            report.output_path = Some(path);
        } else {
            self.services.mailer.send(&email).await?;
            report.status = RunStatus::Delivered;
        }

        info!(
            "Digest run finished: {} stories from {} articles ({} feeds failed)",
            report.stories, report.selected, report.feeds_failed
        );
        Ok(report)
    }

    /// Recency filter, per-feed cap and normalization for one feed's entries.
    async fn process_feed(&self, feed: &FeedSource, entries: Vec<RawEntry>, now: DateTime<Utc>) -> Vec<Article> {
        info!("Processing feed: {}", feed.name);

        let mut recent = filter_recent(entries, self.config.recency_hours, now);
        if let Some(limit) = self.config.selection.per_feed_limit {
            recent.truncate(limit);
        }

        let mut articles = Vec::with_capacity(recent.len());
        for entry in &recent {
            match self.services.normalizer.normalize(entry, feed).await {
                Ok(article) => articles.push(article),
                Err(e) => error!("Processing article from {}: {}", feed.name, e),
            }
        }
        articles
    }

    fn compose(&self, outcome: &SummaryOutcome, selection: &Selection) -> OutgoingEmail {
        let date = Local::now().format("%Y-%m-%d").to_string();
        let sources = match self.config.summary.source_count {
            SourceCount::Categories => selection.category_count,
            SourceCount::Feeds => selection.feed_count,
        };
        let ctx = EmailContext::new(date.as_str(), outcome.result.total_articles, sources)
            .with_version(env!("CARGO_PKG_VERSION"));

        OutgoingEmail {
            subject: self.config.subject_for(&date),
            html_body: render_email(&outcome.result, &ctx),
            recipients: self.config.recipients.clone(),
        }
    }
}
