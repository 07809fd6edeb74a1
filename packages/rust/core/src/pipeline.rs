//! End-to-end answering pipeline: URL → content → relevance → answer → metrics.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use webqa_extract::{ContentSource, PageFetcher};
use webqa_providers::{
    ChatCompletionsClient, Completer, DuckDuckGoSearch, Embedder, HttpEmbedder, SearchProvider,
};
use webqa_shared::{
    AnswerMetrics, AppConfig, FetchSettings, PipelineRequest, PipelineSettings, PipelineStage,
    PipelineState, Result,
};

use crate::answer::{ContextAnswerer, SearchAnswerer};
use crate::relevance::RelevanceScorer;

/// Result of [`Pipeline::analyze`].
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Terminal pipeline state, holding the final answer.
    pub state: PipelineState,
    /// Reported relevance and source attribution.
    pub metrics: AnswerMetrics,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when the analysis completes.
    fn done(&self, analysis: &Analysis);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn done(&self, _analysis: &Analysis) {}
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// The answering pipeline. Cheap to clone; every capability is shared.
#[derive(Clone)]
pub struct Pipeline {
    content: Arc<dyn ContentSource>,
    scorer: RelevanceScorer,
    context: ContextAnswerer,
    search: SearchAnswerer,
}

impl Pipeline {
    pub fn new(
        content: Arc<dyn ContentSource>,
        embedder: Arc<dyn Embedder>,
        completer: Arc<dyn Completer>,
        search: Arc<dyn SearchProvider>,
        settings: &PipelineSettings,
    ) -> Self {
        Self {
            content,
            scorer: RelevanceScorer::from_settings(embedder.clone(), settings),
            context: ContextAnswerer::new(embedder, completer.clone(), settings),
            search: SearchAnswerer::new(search, completer, settings),
        }
    }

    /// Wire the HTTP backends described by `config`.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let fetcher = PageFetcher::new(&FetchSettings::from(config))?;
        let embedder = HttpEmbedder::from_config(&config.embedding)?;
        let completer = ChatCompletionsClient::from_config(&config.llm)?;
        let search = DuckDuckGoSearch::from_config(&config.search)?;

        Ok(Self::new(
            Arc::new(fetcher),
            Arc::new(embedder),
            Arc::new(completer),
            Arc::new(search),
            &PipelineSettings::from(config),
        ))
    }

    /// Drive a request through `Start → ContentFetched → Answered`.
    pub async fn run(
        &self,
        request: &PipelineRequest,
        progress: &dyn ProgressReporter,
    ) -> Result<PipelineState> {
        let mut state = PipelineState::new(request);

        progress.phase("Fetching page");
        self.fetch_content(&mut state).await;

        self.generate_answer(&mut state, progress).await?;
        Ok(state)
    }

    /// Run the pipeline, then score the page a second time for the reported
    /// metrics.
    #[instrument(skip_all, fields(run_id = %Uuid::now_v7(), url = %request.url))]
    pub async fn analyze(
        &self,
        request: &PipelineRequest,
        progress: &dyn ProgressReporter,
    ) -> Result<Analysis> {
        let start = Instant::now();
        info!("starting analysis");

        let state = self.run(request, progress).await?;

        progress.phase("Scoring relevance for metrics");
        let score = self.scorer.score(&state.question, &state.content).await?;
        let metrics = AnswerMetrics::from_score(score);

        info!(
            relevance_score = metrics.relevance_score,
            source = %metrics.source,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "analysis complete"
        );

        let analysis = Analysis { state, metrics };
        progress.done(&analysis);
        Ok(analysis)
    }

    /// `Start → ContentFetched`. Never fails; a failed fetch leaves the
    /// content empty.
    async fn fetch_content(&self, state: &mut PipelineState) {
        state.content = self.content.fetch_content(&state.url).await;
        state.stage = PipelineStage::ContentFetched;
    }

    /// `ContentFetched → Answered`.
    async fn generate_answer(
        &self,
        state: &mut PipelineState,
        progress: &dyn ProgressReporter,
    ) -> Result<()> {
        progress.phase("Scoring relevance");
        let relevance = self.scorer.evaluate(&state.question, &state.content).await?;

        state.final_answer = if relevance.is_relevant {
            progress.phase("Answering from page");
            match self.context.answer(&state.question, &state.content).await {
                Ok(answer) => answer,
                Err(e) => {
                    warn!(error = %e, "context answer failed, falling back to web search");
                    progress.phase("Answering from web search");
                    self.search.answer(&state.question).await
                }
            }
        } else {
            progress.phase("Answering from web search");
            self.search.answer(&state.question).await
        };

        state.stage = PipelineStage::Answered;
        Ok(())
    }
}
