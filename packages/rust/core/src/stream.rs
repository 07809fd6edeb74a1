//! Presentational streaming of a finished answer.
//!
//! The answer is already complete when presentation starts; it is re-chunked
//! into one event per word so clients can render progressively, followed by
//! a single metrics event.

use std::iter::FusedIterator;

use serde::Serialize;

use webqa_shared::AnswerMetrics;

/// One streamed payload.
///
/// Serializes as `{"answer": "<word> "}` or `{"metrics": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamEvent {
    Answer(String),
    Metrics(AnswerMetrics),
}

impl StreamEvent {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Render as a server-sent-events frame: `data: <json>\n\n`.
    pub fn to_sse_frame(&self) -> serde_json::Result<String> {
        Ok(format!("data: {}\n\n", self.to_json()?))
    }
}

/// Event sequence for one answer: every word, then the metrics.
///
/// Produced lazily and consumed once.
#[derive(Debug)]
pub struct Presentation {
    answer: String,
    pos: usize,
    metrics: Option<AnswerMetrics>,
}

/// Present `answer` word by word, finishing with `metrics`.
pub fn present(answer: String, metrics: AnswerMetrics) -> Presentation {
    Presentation {
        answer,
        pos: 0,
        metrics: Some(metrics),
    }
}

impl Iterator for Presentation {
    type Item = StreamEvent;

    fn next(&mut self) -> Option<StreamEvent> {
        let rest = self.answer[self.pos..].trim_start();
        if !rest.is_empty() {
            let start = self.answer.len() - rest.len();
            let end = rest
                .find(char::is_whitespace)
                .map_or(self.answer.len(), |i| start + i);
            let event = StreamEvent::Answer(format!("{} ", &self.answer[start..end]));
            self.pos = end;
            return Some(event);
        }

        self.pos = self.answer.len();
        self.metrics.take().map(StreamEvent::Metrics)
    }
}

impl FusedIterator for Presentation {}
