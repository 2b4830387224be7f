use crate::types::SummarizationError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Body of a chat-completion call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl ChatRequest {
    /// Single user-message request.
    pub fn user(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.into(),
            }],
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Anything that can answer a chat-completion request with the assistant's text.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn complete(&self, api_key: &str, request: &ChatRequest) -> Result<String, SummarizationError>;
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

/// OpenRouter (or any OpenAI-compatible) chat-completion endpoint.
pub struct OpenRouterClient {
    client: Client,
    endpoint: String,
}

impl OpenRouterClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, SummarizationError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SummarizationError::Transport(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl ChatTransport for OpenRouterClient {
    async fn complete(&self, api_key: &str, request: &ChatRequest) -> Result<String, SummarizationError> {
        let t0 = Instant::now();

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| SummarizationError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("unknown error"));
            warn!(
                status = status.as_u16(),
                elapsed_ms = t0.elapsed().as_millis() as u64,
                "chat completion returned an error status"
            );
            return Err(SummarizationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| SummarizationError::Parse(format!("unexpected response envelope: {}", e)))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| SummarizationError::Parse("response contained no choices".to_string()))?;

        debug!(
            model = %request.model,
            elapsed_ms = t0.elapsed().as_millis() as u64,
            chars = content.len(),
            "chat completion succeeded"
        );
        Ok(content)
    }
}
