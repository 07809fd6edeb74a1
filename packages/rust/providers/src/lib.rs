//! Capability backends consumed by the answering pipeline.
//!
//! Each capability is a trait so the pipeline can be driven by test doubles:
//! - [`Embedder`]: text → fixed-length vector ([`HttpEmbedder`])
//! - [`Completer`]: prompt → text ([`ChatCompletionsClient`])
//! - [`SearchProvider`]: query → ranked snippets ([`DuckDuckGoSearch`])
//!
//! The HTTP backends speak the OpenAI-compatible wire format, so Groq,
//! OpenAI, Ollama and text-embeddings-inference all work unchanged.

pub mod completion;
pub mod embed;
pub mod search;

pub use completion::{ChatCompletionsClient, Completer, CompletionRequest};
pub use embed::{Embedder, Embedding, HttpEmbedder};
pub use search::{DuckDuckGoSearch, SearchHit, SearchProvider};

/// Read an env var, treating blank values as unset.
pub(crate) fn env_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
