//! LLM Client: the single point of entry for chat-completion calls.
//!
//! Speaks the OpenAI-compatible `/chat/completions` wire format used by DeepSeek.
//! Model and temperature are hardcoded; the endpoint URL and timeout come from `Config`.
//!
//! One attempt per call: no retry, no backoff. Every failure is a typed `LlmError`,
//! never a string that could be mistaken for model output.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;

/// The model used for all completion calls.
pub const MODEL: &str = "deepseek-chat";
pub const TEMPERATURE: f32 = 0.7;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("completion request timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("completion endpoint failed with status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("unexpected completion response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM returned no choices")]
    EmptyContent,
}

/// Anything that can turn a prompt into completion text.
/// Carried in `AppState` as `Arc<dyn CompletionBackend>`.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;

    /// Model identifier reported back to the operator.
    fn model(&self) -> &str;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl ChatResponse {
    /// Consumes the response, returning the content of the first choice.
    pub fn into_text(self) -> Option<String> {
        self.choices.into_iter().next().map(|c| c.message.content)
    }
}

#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_url: String,
    api_key: Option<String>,
    timeout_secs: u64,
}

impl LlmClient {
    pub fn new(config: &Config) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(config.llm_timeout_secs))
                .build()?,
            api_url: config.llm_api_url.clone(),
            api_key: config.llm_api_key.clone(),
            timeout_secs: config.llm_timeout_secs,
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Makes one call to the completion endpoint and returns the first choice's text.
    pub async fn call(&self, prompt: &str) -> Result<String, LlmError> {
        let request_body = ChatRequest {
            model: MODEL,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: TEMPERATURE,
        };

        // A missing key still goes out as an empty bearer token; the endpoint rejects it.
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(self.api_key.as_deref().unwrap_or_default())
            .json(&request_body)
            .send()
            .await
            .map_err(|e| self.classify_transport_error(e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.classify_transport_error(e))?;

        if status != StatusCode::OK {
            warn!("Completion endpoint returned {}", status);
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&body)?;

        if let Some(usage) = &parsed.usage {
            debug!(
                "Completion succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        parsed.into_text().ok_or(LlmError::EmptyContent)
    }

    fn classify_transport_error(&self, e: reqwest::Error) -> LlmError {
        if e.is_timeout() {
            LlmError::Timeout {
                secs: self.timeout_secs,
            }
        } else {
            LlmError::Http(e)
        }
    }
}

#[async_trait]
impl CompletionBackend for LlmClient {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        self.call(prompt).await
    }

    fn model(&self) -> &str {
        MODEL
    }
}
