//! Chat model abstraction
//!
//! Provides a unified interface for chat-completion providers:
//! - OpenAI-compatible HTTP endpoints
//! - Mock models for testing
//!
//! The router sends exactly one user-role message per invocation and
//! reads exactly one response message's text content. Retry and
//! deadlines live here, not in the router.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::errors::{Result, RouterError};

/// Trait for chat model invocation
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send a single user message and return the response text
    async fn chat(&self, prompt: &str) -> Result<String>;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// OpenAI-compatible chat completion client
pub struct OpenAiChatModel {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    config: LlmConfig,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageBody,
}

#[derive(Deserialize)]
struct ChatMessageBody {
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

impl OpenAiChatModel {
    /// Create a new client from configuration
    pub fn new(config: LlmConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| RouterError::Configuration {
                message: "chat API key required".to_string(),
            })?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| RouterError::Configuration {
                message: format!("failed to create HTTP client: {}", e),
            })?;

        let base_url = config
            .api_base
            .clone()
            .unwrap_or_else(|| "https://api.openai.com/v1".to_string());

        Ok(Self {
            client,
            api_key,
            base_url,
            config,
        })
    }

    /// Make request with retry
    async fn request_with_retry(&self, prompt: &str) -> Result<String> {
        let max_retries = self.config.max_retries.max(1);
        let mut last_error = None;

        for attempt in 0..max_retries {
            if attempt > 0 {
                // Exponential backoff
                let delay = Duration::from_millis(100 * (2_u64.pow(attempt)));
                tokio::time::sleep(delay).await;
            }

            match self.make_request(prompt).await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    tracing::warn!(
                        attempt = attempt + 1,
                        max_retries = max_retries,
                        error = %e,
                        "Chat request failed, retrying"
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| RouterError::invocation("unknown error after retries")))
    }

    async fn make_request(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);

        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            // Routing wants a deterministic pick, not creative prose.
            temperature: 0.0,
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| RouterError::invocation(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RouterError::invocation(format!(
                "API error {}: {}",
                status, body
            )));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| RouterError::invocation(format!("failed to parse response: {}", e)))?;

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| RouterError::invocation("empty response"))
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    async fn chat(&self, prompt: &str) -> Result<String> {
        self.request_with_retry(prompt).await
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

/// Mock chat model for testing
///
/// Replies with a fixed response or always fails, and records the last
/// prompt so tests can assert on the rendered text.
pub struct MockChatModel {
    reply: std::result::Result<String, String>,
    last_prompt: Mutex<Option<String>>,
}

impl MockChatModel {
    /// A mock that always responds with the given text
    pub fn responding(response: impl Into<String>) -> Self {
        Self {
            reply: Ok(response.into()),
            last_prompt: Mutex::new(None),
        }
    }

    /// A mock whose invocation always fails
    pub fn failing() -> Self {
        Self::failing_with("mock chat model failure")
    }

    /// A mock whose invocation always fails with the given message
    pub fn failing_with(message: impl Into<String>) -> Self {
        Self {
            reply: Err(message.into()),
            last_prompt: Mutex::new(None),
        }
    }

    /// The prompt from the most recent invocation
    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ChatModel for MockChatModel {
    async fn chat(&self, prompt: &str) -> Result<String> {
        if let Ok(mut guard) = self.last_prompt.lock() {
            *guard = Some(prompt.to_string());
        }

        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(message) => Err(RouterError::invocation(message.clone())),
        }
    }

    fn model_name(&self) -> &str {
        "mock-chat"
    }
}

/// Create a chat model based on configuration
pub fn create_chat_model(config: &LlmConfig) -> Result<Arc<dyn ChatModel>> {
    match config.provider.as_str() {
        "openai" => Ok(Arc::new(OpenAiChatModel::new(config.clone())?)),
        "mock" => Ok(Arc::new(MockChatModel::responding("1"))),
        other => {
            tracing::warn!(provider = other, "Unknown chat provider, using mock");
            Ok(Arc::new(MockChatModel::responding("1")))
        }
    }
}
