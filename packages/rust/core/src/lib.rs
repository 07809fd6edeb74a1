//! Answering pipeline for webqa.
//!
//! This crate ties the capability backends together into the end-to-end
//! flow: fetch → relevance scoring → context or search answer → presentation.

pub mod answer;
pub mod chunk;
pub mod pipeline;
pub mod relevance;
pub mod stream;

#[cfg(test)]
pub(crate) mod testing;

pub use answer::{ContextAnswerer, SearchAnswerer};
pub use chunk::chunk_text;
pub use pipeline::{Analysis, Pipeline, ProgressReporter, SilentProgress};
pub use relevance::{RelevanceScorer, cosine_similarity};
pub use stream::{Presentation, StreamEvent, present};
