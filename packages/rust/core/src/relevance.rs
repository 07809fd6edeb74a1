//! Relevance scoring: chunk-level embedding similarity behind a keyword gate.
//!
//! The score is effectively binary. It is either zero or the best chunk
//! similarity, and only non-zero when that similarity exceeds the threshold
//! and at least one question word literally appears in the top-ranked
//! chunks. Similarity alone over-triggers on pages that are topically
//! adjacent but do not answer the question.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, instrument};

use webqa_providers::{Embedder, Embedding};
use webqa_shared::{Chunk, PipelineSettings, RelevanceResult, Result, WebQaError};

use crate::chunk::chunk_text;

/// Scores how well page content can answer a question.
#[derive(Clone)]
pub struct RelevanceScorer {
    embedder: Arc<dyn Embedder>,
    threshold: f32,
    chunk_size: usize,
    keyword_window: usize,
}

impl RelevanceScorer {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        threshold: f32,
        chunk_size: usize,
        keyword_window: usize,
    ) -> Self {
        Self {
            embedder,
            threshold,
            chunk_size,
            keyword_window,
        }
    }

    pub fn from_settings(embedder: Arc<dyn Embedder>, settings: &PipelineSettings) -> Self {
        Self::new(
            embedder,
            settings.relevance_threshold,
            settings.score_chunk_size,
            settings.keyword_window,
        )
    }

    /// Full relevance verdict for `content` against `question`.
    ///
    /// Empty content short-circuits to an irrelevant result without touching
    /// the embedder. Embedding failures propagate.
    #[instrument(
        skip_all,
        fields(embedding_model = self.embedder.model_name(), content_chars = content.len())
    )]
    pub async fn evaluate(&self, question: &str, content: &str) -> Result<RelevanceResult> {
        if content.is_empty() {
            debug!("no content to score");
            return Ok(RelevanceResult::irrelevant());
        }

        let keywords = question_keywords(question);

        let chunks = chunk_text(content, self.chunk_size);
        if chunks.is_empty() {
            return Ok(RelevanceResult::irrelevant());
        }

        let similarities = self.similarities(question, &chunks).await?;
        let ranked = rank_descending(&similarities);

        let considered: Vec<Chunk> = ranked
            .iter()
            .take(self.keyword_window)
            .map(|&i| chunks[i].clone())
            .collect();

        let keyword_found = considered.iter().any(|chunk| {
            let lower = chunk.text.to_lowercase();
            keywords.iter().any(|kw| lower.contains(kw.as_str()))
        });

        let max_similarity = ranked.first().map_or(0.0, |&i| similarities[i]);
        let is_relevant = keyword_found && max_similarity > self.threshold;
        let score = if is_relevant {
            max_similarity.clamp(0.0, 1.0)
        } else {
            0.0
        };

        debug!(
            chunks = chunks.len(),
            max_similarity,
            keyword_found,
            score,
            "relevance evaluated"
        );

        Ok(RelevanceResult {
            score,
            chunks_considered: considered,
            is_relevant,
        })
    }

    /// Shorthand for `evaluate(..).score`.
    pub async fn score(&self, question: &str, content: &str) -> Result<f32> {
        Ok(self.evaluate(question, content).await?.score)
    }

    /// Cosine similarity of the question against each chunk, in chunk order.
    async fn similarities(&self, question: &str, chunks: &[Chunk]) -> Result<Vec<f32>> {
        let question_vec = self.embedder.embed(question).await?;
        let chunk_vecs = embed_chunks(self.embedder.as_ref(), chunks).await?;

        Ok(chunk_vecs
            .iter()
            .map(|v| cosine_similarity(&question_vec, v))
            .collect())
    }
}

/// Embed every chunk in one batch, checking the vector count.
pub(crate) async fn embed_chunks(embedder: &dyn Embedder, chunks: &[Chunk]) -> Result<Vec<Embedding>> {
    let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
    let vectors = embedder.embed_batch(&texts).await?;
    if vectors.len() != chunks.len() {
        return Err(WebQaError::Embedding(format!(
            "expected {} chunk embeddings, got {}",
            chunks.len(),
            vectors.len()
        )));
    }
    Ok(vectors)
}

/// Indices of `scores`, highest first. Ties keep their original order.
pub(crate) fn rank_descending(scores: &[f32]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
    order
}

/// Lowercased, whitespace-split question words.
fn question_keywords(question: &str) -> HashSet<String> {
    question
        .to_lowercase()
        .split_whitespace()
        .map(String::from)
        .collect()
}

/// Cosine similarity of two vectors.
///
/// Mismatched lengths, empty or zero-norm vectors, and non-finite results all
/// yield `0.0`.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let sim = dot / (norm_a.sqrt() * norm_b.sqrt());
    if sim.is_finite() { sim } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubEmbedder;

    const QUESTION: &str = "What is Tokio?";

    /// Unit vector whose cosine against `[1, 0]` is `sim`.
    fn at(sim: f32) -> Embedding {
        vec![sim, (1.0 - sim * sim).max(0.0).sqrt()]
    }

    /// Question → `[1, 0]`; any text containing `marker` → `at(sim)`; else orthogonal.
    fn embedder(marker: &'static str, sim: f32) -> Arc<StubEmbedder> {
        Arc::new(StubEmbedder::new(move |text| {
            if text == QUESTION {
                vec![1.0, 0.0]
            } else if text.contains(marker) {
                at(sim)
            } else {
                vec![0.0, 1.0]
            }
        }))
    }

    fn scorer(embedder: Arc<StubEmbedder>, chunk_size: usize) -> RelevanceScorer {
        RelevanceScorer::new(embedder, 0.6, chunk_size, 2)
    }

    #[tokio::test]
    async fn empty_content_scores_zero_without_embedding() {
        let emb = embedder("tokio", 0.9);
        let result = scorer(emb.clone(), 1000).evaluate(QUESTION, "").await.unwrap();
        assert_eq!(result.score, 0.0);
        assert!(!result.is_relevant);
        assert!(result.chunks_considered.is_empty());
        assert_eq!(emb.calls(), 0);
    }

    #[tokio::test]
    async fn on_topic_content_scores_best_similarity() {
        let content = "Tokio is an asynchronous runtime for Rust. ".repeat(10);
        let result = scorer(embedder("Tokio", 0.85), 1000)
            .evaluate(QUESTION, &content)
            .await
            .unwrap();
        assert!(result.is_relevant);
        assert!((result.score - 0.85).abs() < 1e-5);
    }

    #[tokio::test]
    async fn keyword_gate_zeroes_similar_but_unrelated_content() {
        // Highly similar embedding, but no question word appears in the text.
        let content = "An event-driven, non-blocking I/O platform for writing network apps.";
        let result = scorer(embedder("event-driven", 0.9), 1000)
            .evaluate(QUESTION, content)
            .await
            .unwrap();
        assert_eq!(result.score, 0.0);
        assert!(!result.is_relevant);
        assert_eq!(result.chunks_considered.len(), 1);
    }

    #[tokio::test]
    async fn keyword_match_is_case_insensitive() {
        let result = scorer(embedder("TOKIO", 0.8), 1000)
            .evaluate(QUESTION, "WHAT IS TOKIO: RUNTIME DOCUMENTATION")
            .await
            .unwrap();
        assert!((result.score - 0.8).abs() < 1e-5);
    }

    #[tokio::test]
    async fn below_threshold_scores_zero() {
        let result = scorer(embedder("Tokio", 0.55), 1000)
            .evaluate(QUESTION, "Tokio is an asynchronous runtime.")
            .await
            .unwrap();
        assert_eq!(result.score, 0.0);
        assert!(!result.is_relevant);
    }

    #[tokio::test]
    async fn gate_only_inspects_top_ranked_chunks() {
        // Chunks: [keyword, low sim] [no keyword, high sim] [no keyword, high sim]
        let emb = Arc::new(StubEmbedder::new(|text| {
            if text == QUESTION {
                vec![1.0, 0.0]
            } else if text.starts_with('#') {
                at(0.95)
            } else {
                at(0.1)
            }
        }));
        let content = format!("{}{}{}", "what".repeat(5), "#".repeat(20), "#".repeat(20));
        let result = scorer(emb, 20).evaluate(QUESTION, &content).await.unwrap();

        assert_eq!(result.score, 0.0);
        let indices: Vec<usize> = result.chunks_considered.iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![1, 2]);
    }

    #[tokio::test]
    async fn score_is_max_over_all_chunks() {
        // Keyword lives in the second-best chunk; the score is still the best one.
        let emb = Arc::new(StubEmbedder::new(|text| {
            if text == QUESTION {
                vec![1.0, 0.0]
            } else if text.contains("tokio") {
                at(0.7)
            } else if text.contains("runtime") {
                at(0.9)
            } else {
                at(0.0)
            }
        }));
        let content = format!("{:<20}{:<20}{:<20}", "is tokio", "runtime", "other");
        let result = scorer(emb, 20).evaluate(QUESTION, &content).await.unwrap();
        assert!((result.score - 0.9).abs() < 1e-5);
        assert_eq!(result.chunks_considered[0].index, 1);
    }

    #[tokio::test]
    async fn embedding_failure_propagates() {
        let err = scorer(Arc::new(StubEmbedder::failing()), 1000)
            .score(QUESTION, "Tokio is an asynchronous runtime.")
            .await
            .unwrap_err();
        assert!(matches!(err, WebQaError::Embedding(_)));
    }

    #[tokio::test]
    async fn degenerate_vectors_score_zero() {
        let emb = Arc::new(StubEmbedder::new(|_| vec![0.0, 0.0]));
        let score = scorer(emb, 1000)
            .score(QUESTION, "Tokio is an asynchronous runtime.")
            .await
            .unwrap();
        assert_eq!(score, 0.0);

        let emb = Arc::new(StubEmbedder::new(|_| vec![f32::NAN, 1.0]));
        let score = scorer(emb, 1000)
            .score(QUESTION, "Tokio is an asynchronous runtime.")
            .await
            .unwrap();
        assert_eq!(score, 0.0);
    }

    #[test]
    fn cosine_basics() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn ranking_is_stable_on_ties() {
        assert_eq!(rank_descending(&[0.5, 0.9, 0.5, 0.9]), vec![1, 3, 0, 2]);
        assert!(rank_descending(&[]).is_empty());
    }

    #[test]
    fn keywords_are_lowercased_words() {
        let kws = question_keywords("  What IS   tokio? ");
        assert_eq!(kws.len(), 3);
        assert!(kws.contains("is"));
        assert!(kws.contains("tokio?"));
    }
}
