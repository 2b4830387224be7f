pub mod config;
pub mod dedupe;
pub mod extractor;
pub mod fetcher;
pub mod llm_adapter;
pub mod normalizer;
pub mod parser;
pub mod pipeline;
pub mod recency;
pub mod retry;
pub mod selector;
pub mod similarity;
pub mod summarizer;
pub mod translate;
pub mod types;

pub use config::{AppConfig, Env};
pub use dedupe::Deduplicator;
pub use fetcher::{FeedTransport, Fetcher, HttpFeedTransport};
pub use llm_adapter::{ChatRequest, ChatTransport, OpenRouterClient};
pub use normalizer::{ContentNormalizer, NormalizationMode};
pub use pipeline::{AlertHook, DigestPipeline, LogAlertHook, PipelineServices, RunReport, RunStatus};
pub use selector::{CategorySelector, Selection, SelectionPolicy};
pub use summarizer::{Summarizer, SummarizerConfig, SummaryOutcome};
pub use types::*;
