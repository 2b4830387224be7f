use crate::fetcher::HttpFeedTransport;
use crate::types::NormalizationError;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

const TEXT_WIDTH: usize = 100;

/// Pulls the readable text out of an article page.
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    async fn extract(&self, url: &str) -> Result<String, NormalizationError>;
}

/// Downloads the page and renders its HTML to plain text.
pub struct HtmlExtractor {
    transport: Arc<HttpFeedTransport>,
}

impl HtmlExtractor {
    pub fn new(transport: Arc<HttpFeedTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl ContentExtractor for HtmlExtractor {
    async fn extract(&self, url: &str) -> Result<String, NormalizationError> {
        let html = self
            .transport
            .get_text(url)
            .await
            .map_err(|e| NormalizationError::Extraction(e.to_string()))?;

        let text = html_to_text(&html);
        debug!("Extracted {} bytes of text from {}", text.len(), url);
        Ok(text)
    }
}

/// Plain-text rendering of an HTML page, trimmed.
pub fn html_to_text(html: &str) -> String {
    html2text::from_read(html.as_bytes(), TEXT_WIDTH)
        .trim()
        .to_string()
}
