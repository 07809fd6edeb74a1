//! Page fetching and main-content extraction.
//!
//! This crate provides:
//! - [`PageFetcher`]: fail-soft HTTP fetch of a single page
//! - [`extract_main_text`]: reduces raw HTML to its main readable text
//! - [`ContentSource`]: the seam the pipeline fetches content through

pub mod extract;
pub mod fetcher;

pub use extract::{ExtractOptions, extract_main_text};
pub use fetcher::{PageFetcher, is_ssrf_target};

use url::Url;

/// Anything that can turn a URL into page text.
///
/// Implementations never fail: an unreachable or unparseable page yields an
/// empty string, which the pipeline treats as "irrelevant".
#[async_trait::async_trait]
pub trait ContentSource: Send + Sync {
    async fn fetch_content(&self, url: &Url) -> String;
}
