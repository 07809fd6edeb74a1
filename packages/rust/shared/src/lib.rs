//! Shared types, error model, and configuration for webqa.
//!
//! This crate is the foundation depended on by all other webqa crates.
//! It provides:
//! - [`WebQaError`]: the unified error type
//! - Domain types ([`PipelineRequest`], [`PipelineState`], [`Chunk`],
//!   [`RelevanceResult`], [`AnswerMetrics`])
//! - Configuration ([`AppConfig`], runtime settings, config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, EmbeddingConfig, FetchConfig, FetchSettings, LlmConfig, PipelineConfig,
    PipelineSettings, SearchConfig, ServerConfig, config_dir, config_file_path, init_config,
    load_config, load_config_from, validate_api_key,
};
pub use error::{Result, WebQaError};
pub use types::{
    AnswerMetrics, AnswerSource, CONTEXT_ANSWER_TAG, Chunk, FALLBACK_APOLOGY, MIN_QUESTION_CHARS,
    PipelineRequest, PipelineStage, PipelineState, RelevanceResult, SEARCH_ANSWER_TAG,
    SOURCE_ATTRIBUTION_THRESHOLD,
};
