//! Answer generation.
//!
//! [`ContextAnswerer`] grounds the model in the most relevant slices of the
//! fetched page and reports backend failures to its caller.
//! [`SearchAnswerer`] grounds it in web search snippets and never fails.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use webqa_providers::{Completer, CompletionRequest, Embedder, SearchHit, SearchProvider};
use webqa_shared::{
    CONTEXT_ANSWER_TAG, FALLBACK_APOLOGY, PipelineSettings, Result, SEARCH_ANSWER_TAG,
};

use crate::chunk::chunk_text;
use crate::relevance::{cosine_similarity, embed_chunks, rank_descending};

// ---------------------------------------------------------------------------
// ContextAnswerer
// ---------------------------------------------------------------------------

/// Answers from the page content itself.
#[derive(Clone)]
pub struct ContextAnswerer {
    embedder: Arc<dyn Embedder>,
    completer: Arc<dyn Completer>,
    model: String,
    chunk_size: usize,
    top_k: usize,
    temperature: f32,
    max_tokens: u32,
}

impl ContextAnswerer {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        completer: Arc<dyn Completer>,
        settings: &PipelineSettings,
    ) -> Self {
        Self {
            embedder,
            completer,
            model: settings.model.clone(),
            chunk_size: settings.context_chunk_size,
            top_k: settings.context_top_k,
            temperature: settings.context_temperature,
            max_tokens: settings.context_max_tokens,
        }
    }

    /// Answer `question` from the `top_k` chunks of `content` most similar
    /// to it. Embedding and completion failures are returned, not absorbed.
    #[instrument(
        skip_all,
        fields(model = %self.model, embedding_model = self.embedder.model_name(), top_k = self.top_k)
    )]
    pub async fn answer(&self, question: &str, content: &str) -> Result<String> {
        let chunks = chunk_text(content, self.chunk_size);

        let question_vec = self.embedder.embed(question).await?;
        let chunk_vecs = embed_chunks(self.embedder.as_ref(), &chunks).await?;
        let similarities: Vec<f32> = chunk_vecs
            .iter()
            .map(|v| cosine_similarity(&question_vec, v))
            .collect();

        let context: String = rank_descending(&similarities)
            .into_iter()
            .take(self.top_k)
            .map(|i| chunks[i].text.as_str())
            .collect();

        let request = CompletionRequest {
            prompt: context_prompt(question, &context),
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: Some(self.max_tokens),
        };
        let text = self.completer.complete(&request).await?;

        info!(
            chunks = chunks.len(),
            context_chars = context.chars().count(),
            "answered from page content"
        );
        Ok(format!("{CONTEXT_ANSWER_TAG} {text}"))
    }
}

fn context_prompt(question: &str, context: &str) -> String {
    format!(
        "Analyze the following information from the web to answer the question.\n\
         Do not speculate: use only the provided context. If the context does not \
         contain the answer, say that no precise information is available.\n\
         \n\
         Context:\n\
         ---\n\
         {context}\n\
         ---\n\
         \n\
         Question: {question}\n\
         \n\
         Answer in detail:"
    )
}

// ---------------------------------------------------------------------------
// SearchAnswerer
// ---------------------------------------------------------------------------

/// Answers from web search snippets.
#[derive(Clone)]
pub struct SearchAnswerer {
    search: Arc<dyn SearchProvider>,
    completer: Arc<dyn Completer>,
    model: String,
    max_results: usize,
    temperature: f32,
}

impl SearchAnswerer {
    pub fn new(
        search: Arc<dyn SearchProvider>,
        completer: Arc<dyn Completer>,
        settings: &PipelineSettings,
    ) -> Self {
        Self {
            search,
            completer,
            model: settings.model.clone(),
            max_results: settings.search_max_results,
            temperature: settings.search_temperature,
        }
    }

    /// Answer `question` from search results. Any failure yields
    /// [`FALLBACK_APOLOGY`].
    #[instrument(skip_all, fields(backend = self.search.name()))]
    pub async fn answer(&self, question: &str) -> String {
        match self.try_answer(question).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!(error = %e, "search answer failed");
                FALLBACK_APOLOGY.to_string()
            }
        }
    }

    async fn try_answer(&self, question: &str) -> Result<String> {
        let hits = self.search.search(question, self.max_results).await?;

        let request = CompletionRequest {
            prompt: search_prompt(question, &format_hits(&hits)),
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: None,
        };
        let text = self.completer.complete(&request).await?;

        info!(hits = hits.len(), "answered from web search");
        Ok(format!("{SEARCH_ANSWER_TAG} {text}"))
    }
}

/// One `"{title}: {body}"` line per hit.
fn format_hits(hits: &[SearchHit]) -> String {
    hits.iter()
        .map(|h| format!("{}: {}", h.title, h.body))
        .collect::<Vec<_>>()
        .join("\n")
}

fn search_prompt(question: &str, results: &str) -> String {
    format!(
        "Answer this question based on web search results:\n\
         Question: {question}\n\
         Search Results: {results}\n\
         Answer in a clear paragraph:"
    )
}
