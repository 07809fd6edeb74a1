//! Application configuration for webqa.
//!
//! User config lives at `~/.webqa/webqa.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WebQaError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "webqa.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".webqa";

/// Desktop browser User-Agent sent with page fetches. Many sites serve
/// stripped or blocked markup to obvious bots.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

// ---------------------------------------------------------------------------
// Config structs (matching webqa.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Relevance and answer-selection tuning.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Page fetch and extraction.
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Language-model backend.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Embedding backend.
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Search backend.
    #[serde(default)]
    pub search: SearchConfig,

    /// HTTP service.
    #[serde(default)]
    pub server: ServerConfig,
}

/// `[pipeline]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Cosine similarity a page must exceed to be answered from directly.
    #[serde(default = "default_relevance_threshold")]
    pub relevance_threshold: f32,

    /// Chunk size (characters) used for relevance scoring.
    #[serde(default = "default_score_chunk_size")]
    pub score_chunk_size: usize,

    /// Chunk size (characters) used for answer grounding.
    #[serde(default = "default_context_chunk_size")]
    pub context_chunk_size: usize,

    /// How many grounding chunks go into the context prompt.
    #[serde(default = "default_context_top_k")]
    pub context_top_k: usize,

    /// How many top-ranked scoring chunks the keyword gate inspects.
    #[serde(default = "default_keyword_window")]
    pub keyword_window: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            relevance_threshold: default_relevance_threshold(),
            score_chunk_size: default_score_chunk_size(),
            context_chunk_size: default_context_chunk_size(),
            context_top_k: default_context_top_k(),
            keyword_window: default_keyword_window(),
        }
    }
}

fn default_relevance_threshold() -> f32 {
    0.6
}
fn default_score_chunk_size() -> usize {
    1000
}
fn default_context_chunk_size() -> usize {
    2000
}
fn default_context_top_k() -> usize {
    4
}
fn default_keyword_window() -> usize {
    2
}

/// `[fetch]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    #[serde(default = "default_fetch_timeout")]
    pub timeout_secs: u64,

    /// User-Agent header for page requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Lines with this many characters or fewer are dropped as boilerplate.
    #[serde(default = "default_min_line_chars")]
    pub min_line_chars: usize,

    /// Extracted text is truncated to this many characters.
    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,

    /// Permit fetching loopback/private-network hosts.
    #[serde(default)]
    pub allow_private_hosts: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_fetch_timeout(),
            user_agent: default_user_agent(),
            min_line_chars: default_min_line_chars(),
            max_content_chars: default_max_content_chars(),
            allow_private_hosts: false,
        }
    }
}

fn default_fetch_timeout() -> u64 {
    10
}
fn default_user_agent() -> String {
    BROWSER_USER_AGENT.into()
}
fn default_min_line_chars() -> usize {
    40
}
fn default_max_content_chars() -> usize {
    15_000
}

/// `[llm]` section. Any OpenAI-compatible chat-completions endpoint works.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL (without `/v1/...`).
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_llm_api_key_env")]
    pub api_key_env: String,

    /// Model identifier.
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Sampling temperature for page-grounded answers.
    #[serde(default = "default_context_temperature")]
    pub context_temperature: f32,

    /// Response cap for page-grounded answers.
    #[serde(default = "default_context_max_tokens")]
    pub context_max_tokens: u32,

    /// Sampling temperature for search-grounded answers.
    #[serde(default = "default_search_temperature")]
    pub search_temperature: f32,

    /// Request timeout in seconds.
    #[serde(default = "default_backend_timeout")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            api_key_env: default_llm_api_key_env(),
            model: default_llm_model(),
            context_temperature: default_context_temperature(),
            context_max_tokens: default_context_max_tokens(),
            search_temperature: default_search_temperature(),
            timeout_secs: default_backend_timeout(),
        }
    }
}

fn default_llm_base_url() -> String {
    "https://api.groq.com/openai".into()
}
fn default_llm_api_key_env() -> String {
    "GROQ_API_KEY".into()
}
fn default_llm_model() -> String {
    "mixtral-8x7b-32768".into()
}
fn default_context_temperature() -> f32 {
    0.2
}
fn default_context_max_tokens() -> u32 {
    500
}
fn default_search_temperature() -> f32 {
    0.5
}
fn default_backend_timeout() -> u64 {
    60
}

/// `[embedding]` section. Any OpenAI-compatible `/v1/embeddings` endpoint works.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Base URL (without `/v1/...`).
    #[serde(default = "default_embedding_base_url")]
    pub base_url: String,

    /// Env var holding an optional API key.
    #[serde(default = "default_embedding_api_key_env")]
    pub api_key_env: String,

    /// Model identifier.
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Request timeout in seconds.
    #[serde(default = "default_backend_timeout")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: default_embedding_base_url(),
            api_key_env: default_embedding_api_key_env(),
            model: default_embedding_model(),
            timeout_secs: default_backend_timeout(),
        }
    }
}

fn default_embedding_base_url() -> String {
    "http://localhost:8080".into()
}
fn default_embedding_api_key_env() -> String {
    "WEBQA_EMBEDDING_API_KEY".into()
}
fn default_embedding_model() -> String {
    "sentence-transformers/all-mpnet-base-v2".into()
}

/// `[search]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// DuckDuckGo HTML endpoint.
    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,

    /// Number of results fed to the fallback prompt.
    #[serde(default = "default_search_max_results")]
    pub max_results: usize,

    /// Request timeout in seconds.
    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: default_search_endpoint(),
            max_results: default_search_max_results(),
            timeout_secs: default_search_timeout(),
        }
    }
}

fn default_search_endpoint() -> String {
    "https://html.duckduckgo.com/html/".into()
}
fn default_search_max_results() -> usize {
    5
}
fn default_search_timeout() -> u64 {
    20
}

/// `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// CORS origins. Empty allows any origin.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allowed_origins: Vec::new(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8000
}

// ---------------------------------------------------------------------------
// Runtime settings (derived from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime page-fetch settings.
#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// Per-request timeout.
    pub timeout: Duration,
    /// User-Agent header.
    pub user_agent: String,
    /// Lines at or below this length are discarded.
    pub min_line_chars: usize,
    /// Output truncation limit, in characters.
    pub max_content_chars: usize,
    /// Permit loopback/private-network hosts.
    pub allow_private_hosts: bool,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for FetchSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.fetch.timeout_secs),
            user_agent: config.fetch.user_agent.clone(),
            min_line_chars: config.fetch.min_line_chars,
            max_content_chars: config.fetch.max_content_chars,
            allow_private_hosts: config.fetch.allow_private_hosts,
        }
    }
}

/// Runtime settings for relevance scoring and both answerers.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub relevance_threshold: f32,
    pub score_chunk_size: usize,
    pub context_chunk_size: usize,
    pub context_top_k: usize,
    pub keyword_window: usize,
    pub model: String,
    pub context_temperature: f32,
    pub context_max_tokens: u32,
    pub search_temperature: f32,
    pub search_max_results: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for PipelineSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            relevance_threshold: config.pipeline.relevance_threshold,
            score_chunk_size: config.pipeline.score_chunk_size,
            context_chunk_size: config.pipeline.context_chunk_size,
            context_top_k: config.pipeline.context_top_k,
            keyword_window: config.pipeline.keyword_window,
            model: config.llm.model.clone(),
            context_temperature: config.llm.context_temperature,
            context_max_tokens: config.llm.context_max_tokens,
            search_temperature: config.llm.search_temperature,
            search_max_results: config.search.max_results,
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.webqa/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| WebQaError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.webqa/webqa.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| WebQaError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| WebQaError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| WebQaError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| WebQaError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| WebQaError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Check that the LLM API key env var is set and non-empty, returning it.
pub fn validate_api_key(config: &AppConfig) -> Result<String> {
    let var_name = &config.llm.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.trim().is_empty() => Ok(val.trim().to_string()),
        _ => Err(WebQaError::config(format!(
            "LLM API key not found. Set the {var_name} environment variable."
        ))),
    }
}
