//! Web search backends.
//!
//! The default backend scrapes DuckDuckGo's no-JavaScript HTML endpoint,
//! which needs no API key.

use std::sync::LazyLock;
use std::time::Duration;

use scraper::{Html, Selector};
use serde::Serialize;
use tracing::{debug, instrument};

use webqa_shared::config::BROWSER_USER_AGENT;
use webqa_shared::{Result, SearchConfig, WebQaError};

/// One ranked search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub title: String,
    /// Result snippet.
    pub body: String,
    pub url: String,
}

/// Trait for search engines.
#[async_trait::async_trait]
pub trait SearchProvider: Send + Sync {
    /// Short backend name, used in logs.
    fn name(&self) -> &'static str;

    /// Return at most `max_results` hits for `query`, best first.
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>>;
}

// ---------------------------------------------------------------------------
// DuckDuckGoSearch
// ---------------------------------------------------------------------------

static RESULT_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".result").expect("valid selector"));
static LINK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a.result__a").expect("valid selector"));
static SNIPPET_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".result__snippet").expect("valid selector"));

/// DuckDuckGo HTML search.
#[derive(Debug, Clone)]
pub struct DuckDuckGoSearch {
    client: reqwest::Client,
    endpoint: String,
}

impl DuckDuckGoSearch {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| WebQaError::Search(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn from_config(config: &SearchConfig) -> Result<Self> {
        Self::new(
            config.endpoint.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }
}

#[async_trait::async_trait]
impl SearchProvider for DuckDuckGoSearch {
    fn name(&self) -> &'static str {
        "duckduckgo"
    }

    #[instrument(skip_all, fields(backend = "duckduckgo", max_results = max_results))]
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        let response = self
            .client
            .post(&self.endpoint)
            .form(&[("q", query)])
            .header("Accept", "text/html")
            .send()
            .await
            .map_err(|e| WebQaError::Search(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WebQaError::Search(format!("DuckDuckGo HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| WebQaError::Search(format!("body read failed: {e}")))?;

        let hits = parse_results(&body, max_results);
        debug!(hits = hits.len(), "search results parsed");
        Ok(hits)
    }
}

/// Parse a DuckDuckGo HTML results page. Results without a title are skipped.
pub fn parse_results(html: &str, max_results: usize) -> Vec<SearchHit> {
    let doc = Html::parse_document(html);

    doc.select(&RESULT_SELECTOR)
        .filter_map(|result| {
            let link = result.select(&LINK_SELECTOR).next()?;
            let title = collapse_whitespace(&link.text().collect::<String>());
            if title.is_empty() {
                return None;
            }

            let url = link
                .value()
                .attr("href")
                .map(extract_ddg_url)
                .unwrap_or_default();

            let body = result
                .select(&SNIPPET_SELECTOR)
                .next()
                .map(|el| collapse_whitespace(&el.text().collect::<String>()))
                .unwrap_or_default();

            Some(SearchHit { title, body, url })
        })
        .take(max_results)
        .collect()
}

/// Unwrap `//duckduckgo.com/l/?uddg=<encoded>&rut=...` redirect links.
fn extract_ddg_url(href: &str) -> String {
    href.split_once('?')
        .and_then(|(_, query)| {
            url::form_urlencoded::parse(query.as_bytes())
                .find(|(key, _)| key == "uddg")
                .map(|(_, value)| value.into_owned())
        })
        .filter(|target| !target.is_empty())
        .unwrap_or_else(|| href.to_string())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
