//! Text embedding over an OpenAI-compatible `/v1/embeddings` endpoint.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use webqa_shared::{EmbeddingConfig, Result, WebQaError};

/// A vector embedding.
pub type Embedding = Vec<f32>;

/// Trait for text embedding models.
///
/// Implementations must be deterministic for identical input and return
/// vectors of a fixed dimensionality.
#[async_trait::async_trait]
pub trait Embedder: Send + Sync {
    /// Embed several texts, one vector per input, in input order.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>>;

    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Embedding> {
        self.embed_batch(&[text])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| WebQaError::Embedding("model returned no embeddings".into()))
    }

    /// Returns the model name/identifier.
    fn model_name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// HttpEmbedder
// ---------------------------------------------------------------------------

/// Embedder backed by an OpenAI-compatible HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpEmbedder {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl HttpEmbedder {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WebQaError::Embedding(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key,
            model: model.into(),
        })
    }

    /// Build from the `[embedding]` config section. The API key is optional;
    /// self-hosted servers usually run without one.
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        Self::new(
            config.base_url.clone(),
            config.model.clone(),
            crate::env_var(&config.api_key_env),
            Duration::from_secs(config.timeout_secs),
        )
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/embeddings", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait::async_trait]
impl Embedder for HttpEmbedder {
    #[instrument(skip_all, fields(model = %self.model, inputs = texts.len()))]
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbeddingsRequest {
            model: &self.model,
            input: texts,
        };

        let mut rb = self.client.post(self.endpoint()).json(&request);
        if let Some(key) = &self.api_key {
            rb = rb.bearer_auth(key);
        }

        let response = rb
            .send()
            .await
            .map_err(|e| WebQaError::Embedding(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WebQaError::Embedding(format!("embeddings HTTP {status}")));
        }

        let mut parsed: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| WebQaError::parse(format!("malformed embeddings response: {e}")))?;

        if parsed.data.len() != texts.len() {
            return Err(WebQaError::Embedding(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                parsed.data.len()
            )));
        }

        // Servers may answer out of order; `index` is authoritative.
        parsed.data.sort_by_key(|d| d.index);
        debug!(dims = parsed.data[0].embedding.len(), "embeddings received");

        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Embedding,
}
