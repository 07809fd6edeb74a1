//! Text completion over an OpenAI-compatible chat-completions endpoint.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use webqa_shared::{LlmConfig, Result, WebQaError};

/// A single-prompt completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub prompt: String,
    pub model: String,
    pub temperature: f32,
    /// `None` leaves the length to the backend's default.
    pub max_tokens: Option<u32>,
}

/// Trait for language-model backends.
#[async_trait::async_trait]
pub trait Completer: Send + Sync {
    /// Run one completion and return the generated text.
    ///
    /// Network failures, non-success statuses, and responses without any
    /// generated text are all errors.
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

// ---------------------------------------------------------------------------
// ChatCompletionsClient
// ---------------------------------------------------------------------------

/// Client for `POST {base_url}/v1/chat/completions`.
#[derive(Debug, Clone)]
pub struct ChatCompletionsClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl ChatCompletionsClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WebQaError::Completion(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key,
        })
    }

    /// Build from the `[llm]` config section, reading the key from the
    /// configured env var.
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        Self::new(
            config.base_url.clone(),
            crate::env_var(&config.api_key_env),
            Duration::from_secs(config.timeout_secs),
        )
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait::async_trait]
impl Completer for ChatCompletionsClient {
    #[instrument(skip_all, fields(model = %request.model, temperature = request.temperature))]
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let body = ChatCompletionsRequest {
            model: &request.model,
            messages: vec![Message {
                role: "user",
                content: &request.prompt,
            }],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let mut rb = self.client.post(self.endpoint()).json(&body);
        if let Some(key) = &self.api_key {
            rb = rb.bearer_auth(key);
        }

        let response = rb
            .send()
            .await
            .map_err(|e| WebQaError::Completion(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WebQaError::Completion(format!(
                "chat.completions HTTP {status}"
            )));
        }

        let parsed: ChatCompletionsResponse = response
            .json()
            .await
            .map_err(|e| WebQaError::parse(format!("malformed chat.completions response: {e}")))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| WebQaError::Completion("response contained no text".into()))?;

        debug!(chars = text.len(), "completion received");
        Ok(text)
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionsRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionsResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}
