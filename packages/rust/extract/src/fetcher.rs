//! Fail-soft single-page fetcher.
//!
//! Issues one GET with a browser User-Agent and a bounded timeout, then hands
//! the body to [`extract_main_text`]. Every failure is logged and absorbed
//! into an empty string.

use std::net::IpAddr;

use reqwest::Client;
use tracing::{debug, info, instrument, warn};
use url::Url;

use webqa_shared::{FetchSettings, Result, WebQaError};

use crate::ContentSource;
use crate::extract::{ExtractOptions, extract_main_text};

// ---------------------------------------------------------------------------
// PageFetcher
// ---------------------------------------------------------------------------

/// Fetches a page and reduces it to main-content text.
pub struct PageFetcher {
    client: Client,
    options: ExtractOptions,
    allow_private_hosts: bool,
}

impl PageFetcher {
    /// Create a fetcher with the given settings.
    pub fn new(settings: &FetchSettings) -> Result<Self> {
        let client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(settings.timeout)
            .build()
            .map_err(|e| WebQaError::Fetch(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            options: ExtractOptions::from(settings),
            allow_private_hosts: settings.allow_private_hosts,
        })
    }

    /// Fetch `url` and return its main text, or `""` on any failure.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn fetch_content(&self, url: &Url) -> String {
        match self.try_fetch(url).await {
            Ok(text) => {
                info!(chars = text.chars().count(), "page content extracted");
                text
            }
            Err(e) => {
                warn!(error = %e, "content fetch failed, continuing with empty content");
                String::new()
            }
        }
    }

    async fn try_fetch(&self, url: &Url) -> Result<String> {
        if !self.allow_private_hosts && is_ssrf_target(url) {
            return Err(WebQaError::Fetch(format!(
                "{url}: refusing to fetch private or non-HTTP target"
            )));
        }

        debug!("fetching page");

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| WebQaError::Fetch(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WebQaError::Fetch(format!("{url}: HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| WebQaError::Fetch(format!("{url}: body read failed: {e}")))?;

        // `scraper::Html` is !Send; parsing stays inside this synchronous call.
        Ok(extract_main_text(&body, &self.options))
    }
}

#[async_trait::async_trait]
impl ContentSource for PageFetcher {
    async fn fetch_content(&self, url: &Url) -> String {
        PageFetcher::fetch_content(self, url).await
    }
}

// ---------------------------------------------------------------------------
// SSRF protection
// ---------------------------------------------------------------------------

/// Check if a URL targets a potentially dangerous resource.
pub fn is_ssrf_target(url: &Url) -> bool {
    // Block non-HTTP schemes
    match url.scheme() {
        "http" | "https" => {}
        _ => return true,
    }

    match url.host() {
        Some(url::Host::Ipv4(v4)) => is_private_ip(&IpAddr::V4(v4)),
        Some(url::Host::Ipv6(v6)) => is_private_ip(&IpAddr::V6(v6)),
        Some(url::Host::Domain(host)) => {
            host == "localhost" || host.ends_with(".local") || host.ends_with(".internal")
        }
        None => true,
    }
}

/// Check if an IP is in a private/reserved range.
fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_broadcast()
                || v4.is_unspecified()
                // 100.64.0.0/10 (Carrier-grade NAT)
                || (v4.octets()[0] == 100 && (v4.octets()[1] & 0xC0) == 64)
        }
        IpAddr::V6(v6) => v6.is_loopback() || v6.is_unspecified(),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use wiremock::matchers::{header_regex, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ARTICLE: &str = r#"<html><body>
        <nav><a href="/">Home</a></nav>
        <div class="entry-content">
            <h1>Tokio</h1>
            <p>Tokio is an asynchronous runtime for the Rust programming language.</p>
            <p>It provides the building blocks needed for writing network applications.</p>
        </div>
        <footer>Copyright 2024</footer>
    </body></html>"#;

    fn test_settings() -> FetchSettings {
        FetchSettings {
            allow_private_hosts: true,
            ..FetchSettings::default()
        }
    }

    #[tokio::test]
    async fn fetches_and_extracts_main_content() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/post"))
            .and(header_regex("user-agent", r"^Mozilla/5\.0 .*Chrome/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(ARTICLE))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = PageFetcher::new(&test_settings()).unwrap();
        let url = Url::parse(&format!("{}/post", server.uri())).unwrap();
        let text = fetcher.fetch_content(&url).await;

        assert_eq!(
            text,
            "Tokio is an asynchronous runtime for the Rust programming language.\n\
             It provides the building blocks needed for writing network applications."
        );
    }

    #[tokio::test]
    async fn follows_redirects_to_the_article() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(
                ResponseTemplate::new(301).insert_header("location", format!("{}/post", server.uri())),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/post"))
            .respond_with(ResponseTemplate::new(200).set_body_string(ARTICLE))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = PageFetcher::new(&test_settings()).unwrap();
        let url = Url::parse(&format!("{}/old", server.uri())).unwrap();
        let text = fetcher.fetch_content(&url).await;

        assert!(text.starts_with("Tokio is an asynchronous runtime"));
    }

    #[tokio::test]
    async fn http_error_yields_empty_content() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string(ARTICLE))
            .mount(&server)
            .await;

        let fetcher = PageFetcher::new(&test_settings()).unwrap();
        let url = Url::parse(&server.uri()).unwrap();
        assert_eq!(fetcher.fetch_content(&url).await, "");
    }

    #[tokio::test]
    async fn timeout_yields_empty_content() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(ARTICLE)
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let settings = FetchSettings {
            timeout: Duration::from_millis(50),
            ..test_settings()
        };
        let fetcher = PageFetcher::new(&settings).unwrap();
        let url = Url::parse(&server.uri()).unwrap();
        assert_eq!(fetcher.fetch_content(&url).await, "");
    }

    #[tokio::test]
    async fn unreachable_host_yields_empty_content() {
        let fetcher = PageFetcher::new(&test_settings()).unwrap();
        // Port 9 (discard) on loopback is essentially never listening.
        let url = Url::parse("http://127.0.0.1:9/").unwrap();
        assert_eq!(fetcher.fetch_content(&url).await, "");
    }

    #[tokio::test]
    async fn private_hosts_refused_by_default() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(ARTICLE))
            .expect(0)
            .mount(&server)
            .await;

        let fetcher = PageFetcher::new(&FetchSettings::default()).unwrap();
        let url = Url::parse(&server.uri()).unwrap();
        assert_eq!(fetcher.fetch_content(&url).await, "");
    }

    #[test]
    fn test_ssrf_protection_blocks_file() {
        let url = Url::parse("file:///etc/passwd").unwrap();
        assert!(is_ssrf_target(&url));
    }

    #[test]
    fn test_ssrf_protection_blocks_private_ip() {
        for raw in [
            "http://192.168.1.1/admin",
            "http://10.0.0.1/",
            "http://127.0.0.1:8080/",
            "http://[::1]/",
            "http://100.64.0.1/",
        ] {
            let url = Url::parse(raw).unwrap();
            assert!(is_ssrf_target(&url), "{raw} should be blocked");
        }
    }

    #[test]
    fn test_ssrf_blocks_local_names() {
        let url = Url::parse("http://localhost:3000/api").unwrap();
        assert!(is_ssrf_target(&url));

        let url = Url::parse("http://metadata.internal/").unwrap();
        assert!(is_ssrf_target(&url));
    }

    #[test]
    fn test_ssrf_protection_allows_public() {
        let url = Url::parse("https://blog.example.com/post").unwrap();
        assert!(!is_ssrf_target(&url));
    }
}
