use crate::llm_adapter::{ChatRequest, ChatTransport};
use crate::types::{Article, SummarizationError, SummaryResult};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Value shipped in example `.env` files; treated as "no key".
pub const PLACEHOLDER_API_KEY: &str = "your_openrouter_api_key_here";

pub const DEFAULT_TEMPERATURE: f32 = 0.1;

const PROMPT_HEADER: &str = "You are a neutral news analyst specializing in global affairs. \
Analyze the following articles corpus (JSON list with fields: text, url, category, source, published, image_url).";

const PROMPT_TASKS: &str = "For each story generate:
- Overview: 1-2 neutral sentences summarizing the key event.
- Highlights: 3-5 bullet points with facts only (no opinions, no hallucinations; stick to provided content).
- URL(s): list of urls that touched the story.
- Image URL: one of the image_urls from the articles related to the story, if any.

Safeguards: Be factual, neutral, avoid biases (political, cultural). If content is unclear, default to the description. \
Output structured JSON only: {\"stories\": [{\"overview\": \"...\", \"highlights\": [\"...\", \"...\"], \"urls\": [\"...\"], \"image_url\": \"...\"}], \"total_articles\": X, \"sources\": Y}.";

#[derive(Debug, Clone)]
pub struct SummarizerConfig {
    pub model: String,
    pub temperature: f32,
    /// Where the serialized corpus is dumped before the call; `None` disables it.
    pub cache_path: Option<PathBuf>,
    /// Stories wanted per category, in prompt order.
    pub story_mix: Vec<(String, usize)>,
}

impl SummarizerConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: DEFAULT_TEMPERATURE,
            cache_path: None,
            story_mix: Vec::new(),
        }
    }
}

/// What the summarizer produced, and whether it had to fall back.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryOutcome {
    pub result: SummaryResult,
    pub degraded: bool,
}

impl SummaryOutcome {
    fn ok(result: SummaryResult) -> Self {
        Self { result, degraded: false }
    }

    fn degraded(total_articles: usize) -> Self {
        Self {
            result: SummaryResult::degraded(total_articles),
            degraded: true,
        }
    }
}

#[derive(Serialize)]
struct CorpusEntry<'a> {
    text: String,
    url: &'a str,
    category: &'a str,
    source: &'a str,
    published: Option<String>,
    image_url: Option<&'a str>,
}

impl<'a> From<&'a Article> for CorpusEntry<'a> {
    fn from(article: &'a Article) -> Self {
        Self {
            text: article.text(),
            url: &article.url,
            category: &article.category,
            source: &article.source,
            published: article.pub_date.map(|d| d.to_rfc3339()),
            image_url: article.image_url.as_deref(),
        }
    }
}

/// Asks the LLM for the top stories of a corpus.
pub struct Summarizer {
    transport: Arc<dyn ChatTransport>,
    api_key: Option<String>,
    config: SummarizerConfig,
}

impl Summarizer {
    pub fn new(transport: Arc<dyn ChatTransport>, api_key: Option<String>, config: SummarizerConfig) -> Self {
        Self {
            transport,
            api_key,
            config,
        }
    }

    pub async fn summarize(&self, corpus: &[Article]) -> SummaryOutcome {
        if corpus.is_empty() {
            warn!("Empty corpus for LLM");
            return SummaryOutcome::ok(SummaryResult::empty());
        }

        let Some(api_key) = self.usable_key() else {
            error!("OpenRouter API key not set; skipping summarization");
            return SummaryOutcome::degraded(corpus.len());
        };

        match self.call(api_key, corpus).await {
            Ok(result) => {
                info!(
                    "LLM summarized {} articles into {} top stories",
                    corpus.len(),
                    result.stories.len()
                );
                SummaryOutcome::ok(result)
            }
            Err(e) => {
                error!("LLM call failed: {}", e);
                SummaryOutcome::degraded(corpus.len())
            }
        }
    }

    fn usable_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty() && *key != PLACEHOLDER_API_KEY)
    }

    async fn call(&self, api_key: &str, corpus: &[Article]) -> Result<SummaryResult, SummarizationError> {
        let entries: Vec<CorpusEntry> = corpus.iter().map(CorpusEntry::from).collect();
        let corpus_json = serde_json::to_string(&entries)
            .map_err(|e| SummarizationError::Parse(format!("cannot serialize corpus: {}", e)))?;

        self.dump_corpus(&corpus_json).await;

        let request = ChatRequest::user(&self.config.model, self.prompt(&corpus_json))
            .with_temperature(self.config.temperature);
        let content = self.transport.complete(api_key, &request).await?;

        parse_summary(&content, corpus.len())
    }

    async fn dump_corpus(&self, corpus_json: &str) {
        let Some(path) = &self.config.cache_path else {
            return;
        };
        if let Err(e) = tokio::fs::write(path, corpus_json).await {
            warn!("Could not write corpus cache {}: {}", path.display(), e);
        }
    }

    fn prompt(&self, corpus_json: &str) -> String {
        let wanted: usize = self.config.story_mix.iter().map(|(_, n)| n).sum();
        let mix = if wanted == 0 {
            String::from("Pick the most prominent stories.")
        } else {
            let parts: Vec<String> = self
                .config
                .story_mix
                .iter()
                .filter(|(_, n)| *n > 0)
                .map(|(category, n)| format!("{} from {}", n, category))
                .collect();
            format!("Pick {} stories: {}.", wanted, parts.join(", "))
        };

        format!(
            "{}\n\nFind the most prominent news stories (events or topics, not single articles), ensuring \
             diversity across categories. When several sources cover the same story, mention how each portrays it. \
             {}\n\n{}\n\nCorpus: {}",
            PROMPT_HEADER, mix, PROMPT_TASKS, corpus_json
        )
    }
}

/// Parse the model's reply, tolerating prose or code fences around the JSON object.
pub fn parse_summary(content: &str, corpus_len: usize) -> Result<SummaryResult, SummarizationError> {
    let (Some(start), Some(end)) = (content.find('{'), content.rfind('}')) else {
        return Err(SummarizationError::Parse("no JSON object in response".to_string()));
    };
    if end < start {
        return Err(SummarizationError::Parse("no JSON object in response".to_string()));
    }

    let value: serde_json::Value = serde_json::from_str(&content[start..=end])
        .map_err(|e| SummarizationError::Parse(e.to_string()))?;
    let has_total = value.get("total_articles").is_some();

    let mut result: SummaryResult =
        serde_json::from_value(value).map_err(|e| SummarizationError::Parse(e.to_string()))?;
    if !has_total {
        result.total_articles = corpus_len;
    }
    Ok(result)
}
