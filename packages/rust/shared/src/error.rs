//! Error types for webqa.
//!
//! Library crates use [`WebQaError`] via `thiserror`.
//! The `webqa` binary wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all webqa operations.
#[derive(Debug, thiserror::Error)]
pub enum WebQaError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error while fetching the target page.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// HTML or response-body parsing error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Embedding backend failure.
    #[error("embedding error: {0}")]
    Embedding(String),

    /// Language-model backend failure (network, quota, malformed response).
    #[error("completion error: {0}")]
    Completion(String),

    /// Search backend failure.
    #[error("search error: {0}")]
    Search(String),

    /// Malformed request (bad URL, question too short).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, WebQaError>;

impl WebQaError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error stems from a malformed request rather than a
    /// backend or internal failure.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}
