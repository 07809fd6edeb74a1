//! In-crate test doubles for the capability traits.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use url::Url;

use webqa_extract::ContentSource;
use webqa_providers::{Completer, CompletionRequest, Embedder, Embedding, SearchHit, SearchProvider};
use webqa_shared::{Result, WebQaError};

type EmbedFn = Box<dyn Fn(&str) -> Embedding + Send + Sync>;

/// Embeds text with a closure; optionally fails every call.
pub struct StubEmbedder {
    embed: Option<EmbedFn>,
    calls: AtomicUsize,
}

impl StubEmbedder {
    pub fn new(f: impl Fn(&str) -> Embedding + Send + Sync + 'static) -> Self {
        Self {
            embed: Some(Box::new(f)),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            embed: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `embed_batch` calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Embedder for StubEmbedder {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.embed {
            Some(f) => Ok(texts.iter().map(|t| f(*t)).collect()),
            None => Err(WebQaError::Embedding("stub embedder offline".into())),
        }
    }

    fn model_name(&self) -> &str {
        "stub"
    }
}

type CompleteFn = Box<dyn Fn(&CompletionRequest) -> Result<String> + Send + Sync>;

/// Answers completions with a closure and records every request.
pub struct ScriptedCompleter {
    reply: CompleteFn,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedCompleter {
    pub fn new(f: impl Fn(&CompletionRequest) -> Result<String> + Send + Sync + 'static) -> Self {
        Self {
            reply: Box::new(f),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(text: &'static str) -> Self {
        Self::new(move |_| Ok(text.to_string()))
    }

    pub fn failing() -> Self {
        Self::new(|_| Err(WebQaError::Completion("quota exceeded".into())))
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Completer for ScriptedCompleter {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request.clone());
        (self.reply)(request)
    }
}

/// Returns canned hits, or fails when `hits` is `None`.
pub struct StubSearch {
    hits: Option<Vec<SearchHit>>,
    queries: Mutex<Vec<(String, usize)>>,
}

impl StubSearch {
    pub fn with_hits(hits: Vec<SearchHit>) -> Self {
        Self {
            hits: Some(hits),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            hits: None,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<(String, usize)> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl SearchProvider for StubSearch {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        self.queries
            .lock()
            .unwrap()
            .push((query.to_string(), max_results));
        match &self.hits {
            Some(hits) => Ok(hits.iter().take(max_results).cloned().collect()),
            None => Err(WebQaError::Search("stub search offline".into())),
        }
    }
}

/// Serves the same text for every URL.
pub struct StaticContent(pub String);

#[async_trait::async_trait]
impl ContentSource for StaticContent {
    async fn fetch_content(&self, _url: &Url) -> String {
        self.0.clone()
    }
}

pub fn hit(title: &str, body: &str) -> SearchHit {
    SearchHit {
        title: title.into(),
        body: body.into(),
        url: format!("https://example.com/{}", title.to_lowercase().replace(' ', "-")),
    }
}
