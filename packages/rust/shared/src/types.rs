//! Core domain types for a single question-about-a-page request.

use serde::{Deserialize, Serialize};
use url::Url;

/// Minimum question length in characters (after trimming).
pub const MIN_QUESTION_CHARS: usize = 3;

/// Relevance score above which the reported source is the page itself.
///
/// Restated at presentation time rather than propagated from the scorer's
/// configured threshold.
pub const SOURCE_ATTRIBUTION_THRESHOLD: f32 = 0.6;

/// Prefix on answers grounded in the fetched page.
pub const CONTEXT_ANSWER_TAG: &str = "[Web Context Answer]";

/// Prefix on answers grounded in web search results.
pub const SEARCH_ANSWER_TAG: &str = "[Web Search Answer]";

/// Returned when every answering path has failed.
pub const FALLBACK_APOLOGY: &str = "Could not generate an answer at this time";

// ---------------------------------------------------------------------------
// PipelineRequest
// ---------------------------------------------------------------------------

/// A validated inbound question about a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineRequest {
    /// Page to answer from.
    pub url: Url,
    /// The user's question, as submitted.
    pub question: String,
}

impl PipelineRequest {
    /// Validate raw inputs into a request.
    ///
    /// The URL must parse and use `http` or `https`; the question must have at
    /// least [`MIN_QUESTION_CHARS`] non-whitespace-padded characters.
    pub fn new(url: &str, question: impl Into<String>) -> crate::Result<Self> {
        let url = Url::parse(url.trim())
            .map_err(|e| crate::WebQaError::validation(format!("invalid URL '{url}': {e}")))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(crate::WebQaError::validation(format!(
                "unsupported URL scheme '{}': expected http or https",
                url.scheme()
            )));
        }

        let question = question.into();
        if question.trim().chars().count() < MIN_QUESTION_CHARS {
            return Err(crate::WebQaError::validation(format!(
                "question must be at least {MIN_QUESTION_CHARS} characters"
            )));
        }

        Ok(Self { url, question })
    }
}

// ---------------------------------------------------------------------------
// PipelineState
// ---------------------------------------------------------------------------

/// Where a pipeline run currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Start,
    ContentFetched,
    Answered,
}

/// Per-request state, mutated stepwise by the pipeline controller.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineState {
    pub url: Url,
    pub question: String,
    /// Extracted page text; empty when the fetch failed.
    pub content: String,
    /// Empty until the `Answered` stage.
    pub final_answer: String,
    pub stage: PipelineStage,
}

impl PipelineState {
    /// Fresh state at [`PipelineStage::Start`].
    pub fn new(request: &PipelineRequest) -> Self {
        Self {
            url: request.url.clone(),
            question: request.question.clone(),
            content: String::new(),
            final_answer: String::new(),
            stage: PipelineStage::Start,
        }
    }
}

// ---------------------------------------------------------------------------
// Chunk / RelevanceResult
// ---------------------------------------------------------------------------

/// A contiguous slice of source text and its position in the chunk sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    pub index: usize,
    pub text: String,
}

/// Outcome of one relevance evaluation.
#[derive(Debug, Clone, Serialize)]
pub struct RelevanceResult {
    /// Confidence in `[0, 1]`; zero whenever the page is judged irrelevant.
    pub score: f32,
    /// Top-ranked scoring chunks the keyword gate inspected, best first.
    pub chunks_considered: Vec<Chunk>,
    pub is_relevant: bool,
}

impl RelevanceResult {
    /// An irrelevant verdict with nothing considered.
    pub fn irrelevant() -> Self {
        Self {
            score: 0.0,
            chunks_considered: Vec::new(),
            is_relevant: false,
        }
    }
}

// ---------------------------------------------------------------------------
// AnswerMetrics
// ---------------------------------------------------------------------------

/// Which source an answer is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnswerSource {
    #[serde(rename = "Web Page")]
    WebPage,
    #[serde(rename = "Web Search")]
    WebSearch,
}

impl AnswerSource {
    /// Attribute a relevance score using [`SOURCE_ATTRIBUTION_THRESHOLD`].
    pub fn from_score(score: f32) -> Self {
        if score > SOURCE_ATTRIBUTION_THRESHOLD {
            Self::WebPage
        } else {
            Self::WebSearch
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WebPage => "Web Page",
            Self::WebSearch => "Web Search",
        }
    }
}

impl std::fmt::Display for AnswerSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trailing metrics record of a streamed answer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnswerMetrics {
    pub relevance_score: f32,
    pub source: AnswerSource,
}

impl AnswerMetrics {
    pub fn from_score(relevance_score: f32) -> Self {
        Self {
            relevance_score,
            source: AnswerSource::from_score(relevance_score),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_accepts_valid_input() {
        let req = PipelineRequest::new("https://example.com/post", "What is this about?")
            .expect("valid request");
        assert_eq!(req.url.host_str(), Some("example.com"));
        assert_eq!(req.question, "What is this about?");
    }

    #[test]
    fn request_rejects_short_question() {
        let err = PipelineRequest::new("https://example.com", "  hi  ").unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("at least 3"));
    }

    #[test]
    fn request_rejects_bad_urls() {
        assert!(PipelineRequest::new("not a url", "What is it?").is_err());

        let err = PipelineRequest::new("ftp://example.com/file", "What is it?").unwrap_err();
        assert!(err.to_string().contains("ftp"));
    }

    #[test]
    fn state_starts_empty() {
        let req = PipelineRequest::new("https://example.com", "Why?!").unwrap();
        let state = PipelineState::new(&req);
        assert_eq!(state.stage, PipelineStage::Start);
        assert!(state.content.is_empty());
        assert!(state.final_answer.is_empty());
    }

    #[test]
    fn source_attribution_uses_strict_threshold() {
        assert_eq!(AnswerSource::from_score(0.85), AnswerSource::WebPage);
        assert_eq!(AnswerSource::from_score(0.6), AnswerSource::WebSearch);
        assert_eq!(AnswerSource::from_score(0.0), AnswerSource::WebSearch);
    }

    #[test]
    fn metrics_serialize_with_display_names() {
        let json = serde_json::to_string(&AnswerMetrics::from_score(0.75)).unwrap();
        assert_eq!(json, r#"{"relevance_score":0.75,"source":"Web Page"}"#);

        let json = serde_json::to_string(&AnswerMetrics::from_score(0.0)).unwrap();
        assert!(json.contains(r#""source":"Web Search""#));
    }
}
