//! Main-content extraction from raw HTML.
//!
//! Picks the most article-like container, keeps its visible text one node
//! per line, and drops short lines (menus, buttons, bylines).

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use webqa_shared::FetchSettings;

/// Candidate content containers, highest priority first.
static CONTENT_SELECTORS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    ["div.entry-content", "article", "main", "body"]
        .iter()
        .map(|s| Selector::parse(s).expect("valid selector"))
        .collect()
});

/// Elements whose text is never rendered.
const HIDDEN_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// Line filtering and truncation limits.
#[derive(Debug, Clone, Copy)]
pub struct ExtractOptions {
    /// Lines with this many characters or fewer are dropped.
    pub min_line_chars: usize,
    /// Output is cut to this many characters.
    pub max_content_chars: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self::from(&FetchSettings::default())
    }
}

impl From<&FetchSettings> for ExtractOptions {
    fn from(settings: &FetchSettings) -> Self {
        Self {
            min_line_chars: settings.min_line_chars,
            max_content_chars: settings.max_content_chars,
        }
    }
}

/// Reduce an HTML document to its main text.
///
/// Returns an empty string when no container matches or nothing survives
/// the line filter.
pub fn extract_main_text(html: &str, opts: &ExtractOptions) -> String {
    let doc = Html::parse_document(html);

    let Some(root) = select_content_root(&doc) else {
        return String::new();
    };

    let text = visible_text(root);
    let kept: Vec<&str> = text
        .lines()
        .filter(|line| line.chars().count() > opts.min_line_chars)
        .collect();

    truncate_chars(&kept.join("\n"), opts.max_content_chars)
}

/// First element matching [`CONTENT_SELECTORS`], in priority order.
fn select_content_root(doc: &Html) -> Option<ElementRef<'_>> {
    CONTENT_SELECTORS
        .iter()
        .find_map(|sel| doc.select(sel).next())
}

/// Text nodes under `root`, trimmed, one per line, skipping hidden elements.
fn visible_text(root: ElementRef<'_>) -> String {
    let mut lines: Vec<&str> = Vec::new();

    for node in root.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };

        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| HIDDEN_TAGS.contains(&el.name()))
        });
        if hidden {
            continue;
        }

        let trimmed = text.trim();
        if !trimmed.is_empty() {
            lines.push(trimmed);
        }
    }

    lines.join("\n")
}

/// Keep the first `max_chars` characters (not bytes).
fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}
