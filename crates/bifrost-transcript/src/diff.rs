use bifrost_core::{Baseline, TranscriptSnapshot};

use crate::classify::LineClassifier;
use crate::clean::clean_response;

/// Minimum cleaned length for an extraction to count as real content.
/// Short enough to admit terse replies, long enough to reject echo noise.
pub const DEFAULT_MIN_CONTENT_CHARS: usize = 10;

/// Words of the prompt used by the partial-prompt fallback.
const PARTIAL_PROMPT_WORDS: usize = 5;

/// One way of locating new content in a snapshot. Strategies are data: the
/// extractor walks an ordered chain and the first hit wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Everything past the baseline's byte length.
    SuffixDiff,
    /// Everything after the last occurrence of the full prompt.
    LastPromptOccurrence,
    /// Everything after the last occurrence of the prompt's leading words.
    /// Catches the case where the baseline capture itself was partial.
    PartialPrompt,
}

/// Outcome of one diff pass against a baseline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// Cleaned content past the minimum threshold.
    Content(String),
    /// Nothing new beyond the baseline this cycle.
    Nothing,
    /// The snapshot is shorter than the baseline: the source was cleared or
    /// rewritten. The caller must adopt the snapshot as a fresh baseline and
    /// emit nothing for this cycle.
    Truncated,
}

impl Extraction {
    pub fn into_content(self) -> Option<String> {
        match self {
            Extraction::Content(c) => Some(c),
            Extraction::Nothing | Extraction::Truncated => None,
        }
    }
}

/// Layered diff extraction over full-transcript snapshots.
///
/// The capture side channel has no atomicity guarantee, so the baseline
/// itself can be partial or stale. No single strategy is reliable alone;
/// the chain keeps going until one produces threshold-length content.
pub struct DiffExtractor {
    classifier: LineClassifier,
    strategies: Vec<Strategy>,
    min_content_chars: usize,
}

impl Default for DiffExtractor {
    fn default() -> Self {
        let min_content_chars = std::env::var("BIFROST_MIN_CONTENT_CHARS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MIN_CONTENT_CHARS);
        Self {
            classifier: LineClassifier::default(),
            strategies: vec![
                Strategy::SuffixDiff,
                Strategy::LastPromptOccurrence,
                Strategy::PartialPrompt,
            ],
            min_content_chars,
        }
    }
}

impl DiffExtractor {
    pub fn with_classifier(mut self, classifier: LineClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Override the strategy chain. Order is priority order.
    pub fn with_strategies(mut self, strategies: Vec<Strategy>) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn with_min_content_chars(mut self, min: usize) -> Self {
        self.min_content_chars = min;
        self
    }

    /// Isolate the text in `full` that is new relative to `baseline`.
    ///
    /// A shorter-than-baseline snapshot is surfaced as [`Extraction::Truncated`],
    /// never diffed. Strategy failures fall through to the next strategy;
    /// only total exhaustion yields [`Extraction::Nothing`].
    pub fn extract_new(
        &self,
        full: &TranscriptSnapshot,
        baseline: &Baseline,
        original_prompt: &str,
    ) -> Extraction {
        if full.len() < baseline.len() {
            tracing::warn!(
                full_len = full.len(),
                baseline_len = baseline.len(),
                "snapshot shrank below baseline"
            );
            return Extraction::Truncated;
        }

        for strategy in &self.strategies {
            let candidate = match strategy {
                Strategy::SuffixDiff => suffix_diff(&full.text, baseline.len()),
                Strategy::LastPromptOccurrence => after_last(&full.text, original_prompt.trim()),
                Strategy::PartialPrompt => {
                    after_last(&full.text, &leading_words(original_prompt, PARTIAL_PROMPT_WORDS))
                }
            };
            if let Some(raw) = candidate {
                if let Some(content) = self.accept(raw, original_prompt) {
                    tracing::debug!(?strategy, chars = content.len(), "extraction hit");
                    return Extraction::Content(content);
                }
            }
        }
        Extraction::Nothing
    }

    /// Clean a raw candidate and apply the length threshold.
    fn accept(&self, raw: &str, original_prompt: &str) -> Option<String> {
        let cleaned = clean_response(raw.trim(), original_prompt, &self.classifier);
        (cleaned.len() > self.min_content_chars).then_some(cleaned)
    }
}

fn suffix_diff(full: &str, baseline_len: usize) -> Option<&str> {
    if full.len() <= baseline_len {
        return None;
    }
    // The capture is lossy; the snapshot is not guaranteed to extend the
    // baseline on a char boundary.
    let at = ceil_char_boundary(full, baseline_len);
    Some(&full[at..])
}

fn after_last<'a>(full: &'a str, needle: &str) -> Option<&'a str> {
    if needle.is_empty() {
        return None;
    }
    let idx = full.rfind(needle)?;
    Some(&full[idx + needle.len()..])
}

/// First `n` whitespace-separated words, joined by single spaces.
fn leading_words(text: &str, n: usize) -> String {
    text.split_whitespace().take(n).collect::<Vec<_>>().join(" ")
}

/// Return the smallest byte index `>= i` that is a valid char boundary.
fn ceil_char_boundary(s: &str, i: usize) -> usize {
    if i >= s.len() {
        return s.len();
    }
    let mut pos = i;
    while pos < s.len() && !s.is_char_boundary(pos) {
        pos += 1;
    }
    pos
}
