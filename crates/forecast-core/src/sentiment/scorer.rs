//! Sentiment scorer wrapping a classifier

use super::{ProxySentenceSource, SentimentClassifier, SentimentResult, TextSource};
use std::sync::Arc;
use tracing::{debug, warn};

/// Classifier input limit, counted in characters
pub const MAX_TEXT_CHARS: usize = 500;

/// Keep at most `max_chars` characters of `text`
///
/// Cuts on a character boundary, so multi-byte text is never split.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Scores text or entities on the 1–5 star scale
///
/// Never fails: unparseable labels and classifier errors both degrade to the
/// neutral rating.
#[derive(Clone)]
pub struct SentimentScorer {
    classifier: Arc<dyn SentimentClassifier>,
    text_source: Arc<dyn TextSource>,
    max_chars: usize,
}

impl SentimentScorer {
    /// Scorer using the proxy sentence source and the default text limit
    pub fn new(classifier: Arc<dyn SentimentClassifier>) -> Self {
        Self {
            classifier,
            text_source: Arc::new(ProxySentenceSource),
            max_chars: MAX_TEXT_CHARS,
        }
    }

    pub fn with_text_source(mut self, text_source: Arc<dyn TextSource>) -> Self {
        self.text_source = text_source;
        self
    }

    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }

    pub fn classifier_name(&self) -> &str {
        self.classifier.name()
    }

    /// Score raw text
    pub fn score_text(&self, text: &str) -> SentimentResult {
        let input = truncate_chars(text, self.max_chars);
        match self.classifier.classify(input) {
            Ok(label) => {
                let result = SentimentResult::from_classifier_label(&label);
                debug!(
                    classifier = self.classifier.name(),
                    raw_label = %label,
                    stars = result.stars(),
                    "Scored text"
                );
                result
            }
            Err(e) => {
                warn!(
                    classifier = self.classifier.name(),
                    error = %e,
                    "Classifier failed, using neutral sentiment"
                );
                SentimentResult::neutral()
            }
        }
    }

    /// Score an entity through the configured text source
    pub fn score_entity(&self, entity: &str) -> SentimentResult {
        let text = self.text_source.text_for(entity);
        self.score_text(&text)
    }
}

impl std::fmt::Debug for SentimentScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentimentScorer")
            .field("classifier", &self.classifier.name())
            .field("max_chars", &self.max_chars)
            .finish_non_exhaustive()
    }
}
