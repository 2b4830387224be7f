use crate::llm_adapter::{ChatRequest, ChatTransport};
use crate::types::NormalizationError;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str) -> Result<String, NormalizationError>;
}

/// Leaves text as it is; used when no target language is configured.
pub struct IdentityTranslator;

#[async_trait]
impl Translator for IdentityTranslator {
    async fn translate(&self, text: &str) -> Result<String, NormalizationError> {
        Ok(text.to_string())
    }
}

/// Translates through a chat-completion model.
pub struct ChatTranslator {
    transport: Arc<dyn ChatTransport>,
    api_key: String,
    model: String,
    target_language: String,
}

impl ChatTranslator {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        target_language: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            api_key: api_key.into(),
            model: model.into(),
            target_language: target_language.into(),
        }
    }

    fn prompt(&self, text: &str) -> String {
        format!(
            "Translate the following text to {}. Provide only the translated text \
             without any additional comments or explanations:\n\n{}",
            self.target_language, text
        )
    }
}

#[async_trait]
impl Translator for ChatTranslator {
    async fn translate(&self, text: &str) -> Result<String, NormalizationError> {
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }

        let request = ChatRequest::user(&self.model, self.prompt(text));
        let translated = self
            .transport
            .complete(&self.api_key, &request)
            .await
            .map_err(|e| NormalizationError::Translation(e.to_string()))?;

        debug!(
            "Translated {} chars to {}",
            text.chars().count(),
            self.target_language
        );
        Ok(translated.trim().to_string())
    }
}
