//! Sentiment classifiers producing star-rating labels

use crate::error::Result;
use std::collections::HashMap;

/// A text classifier whose labels start with a star digit
///
/// Implementations return labels in the `"N star(s)"` convention used by
/// multilingual review-rating models. The scorer only relies on the first
/// character, so any label beginning with `1`–`5` is acceptable.
#[cfg_attr(test, mockall::automock)]
pub trait SentimentClassifier: Send + Sync {
    /// Classify `text` and return the raw label
    fn classify(&self, text: &str) -> Result<String>;

    /// Classifier identifier for logs and responses
    fn name(&self) -> &str;
}

/// Rule-based financial lexicon classifier
///
/// Averages word polarities in `[-1, 1]` with negation flipping and
/// intensifier scaling, then buckets the average into 1–5 stars.
pub struct LexiconClassifier {
    words: HashMap<&'static str, f64>,
    negations: Vec<&'static str>,
    intensifiers: HashMap<&'static str, f64>,
}

impl Default for LexiconClassifier {
    fn default() -> Self {
        Self::new()
    }
}

const POSITIVE_WORDS: &[(&str, f64)] = &[
    ("bullish", 0.8),
    ("surge", 0.7),
    ("rally", 0.7),
    ("soar", 0.8),
    ("gain", 0.5),
    ("profit", 0.6),
    ("profitable", 0.6),
    ("growth", 0.6),
    ("grow", 0.5),
    ("rise", 0.5),
    ("increase", 0.5),
    ("improve", 0.5),
    ("outperform", 0.7),
    ("beat", 0.6),
    ("exceed", 0.6),
    ("strong", 0.5),
    ("positive", 0.5),
    ("optimistic", 0.6),
    ("confident", 0.5),
    ("record", 0.6),
    ("upgrade", 0.6),
    ("buy", 0.5),
    ("breakout", 0.6),
    ("momentum", 0.4),
    ("recovery", 0.5),
    ("rebound", 0.5),
    ("success", 0.6),
    ("successful", 0.6),
    ("win", 0.5),
    ("expand", 0.4),
    ("dividend", 0.3),
];

const NEGATIVE_WORDS: &[(&str, f64)] = &[
    ("bearish", -0.8),
    ("crash", -0.9),
    ("plunge", -0.8),
    ("drop", -0.6),
    ("fall", -0.5),
    ("decline", -0.6),
    ("loss", -0.6),
    ("lose", -0.6),
    ("decrease", -0.5),
    ("weak", -0.5),
    ("negative", -0.5),
    ("pessimistic", -0.6),
    ("concern", -0.5),
    ("worry", -0.5),
    ("fear", -0.6),
    ("risk", -0.4),
    ("volatile", -0.3),
    ("uncertainty", -0.5),
    ("miss", -0.6),
    ("disappoint", -0.7),
    ("disappointing", -0.7),
    ("underperform", -0.6),
    ("downgrade", -0.6),
    ("sell", -0.5),
    ("dump", -0.7),
    ("correction", -0.4),
    ("crisis", -0.8),
    ("warning", -0.5),
    ("trouble", -0.6),
    ("problem", -0.5),
    ("fail", -0.7),
    ("lawsuit", -0.6),
    ("layoff", -0.6),
    ("bankruptcy", -0.9),
    ("fraud", -0.9),
];

const NEGATIONS: &[&str] = &[
    "not", "no", "never", "neither", "nobody", "nothing", "none", "cannot", "cant", "don't",
    "dont", "doesn't", "doesnt", "didn't", "didnt", "won't", "wont", "isn't", "isnt", "aren't",
    "arent", "wasn't", "wasnt", "hardly", "barely",
];

const INTENSIFIERS: &[(&str, f64)] = &[
    ("very", 1.5),
    ("extremely", 2.0),
    ("highly", 1.5),
    ("significantly", 1.5),
    ("sharply", 1.5),
    ("dramatically", 1.8),
    ("massively", 1.8),
    ("slightly", 0.5),
    ("somewhat", 0.7),
    ("marginally", 0.5),
];

impl LexiconClassifier {
    /// Create a classifier with the built-in financial lexicon
    pub fn new() -> Self {
        Self {
            words: POSITIVE_WORDS
                .iter()
                .chain(NEGATIVE_WORDS)
                .copied()
                .collect(),
            negations: NEGATIONS.to_vec(),
            intensifiers: INTENSIFIERS.iter().copied().collect(),
        }
    }

    /// Polarity of `text` in `[-1, 1]`; 0 when no lexicon word matches
    pub fn polarity(&self, text: &str) -> f64 {
        let mut scores = Vec::new();
        let mut negate_next = false;
        let mut intensifier = 1.0;

        for token in text.split_whitespace().map(normalize_token) {
            if token.is_empty() {
                continue;
            }
            if self.negations.contains(&token.as_str()) {
                negate_next = true;
                continue;
            }
            if let Some(mult) = self.intensifiers.get(token.as_str()) {
                intensifier = *mult;
                continue;
            }

            match self.word_score(&token) {
                Some(mut score) => {
                    if negate_next {
                        score = -score;
                        negate_next = false;
                    }
                    scores.push(score * intensifier);
                    intensifier = 1.0;
                }
                None => {
                    negate_next = false;
                    intensifier = 1.0;
                }
            }
        }

        if scores.is_empty() {
            return 0.0;
        }
        (scores.iter().sum::<f64>() / scores.len() as f64).clamp(-1.0, 1.0)
    }

    /// Star rating for a polarity value
    pub fn stars_for(polarity: f64) -> u8 {
        if polarity <= -0.6 {
            1
        } else if polarity <= -0.2 {
            2
        } else if polarity < 0.2 {
            3
        } else if polarity < 0.6 {
            4
        } else {
            5
        }
    }

    /// Look up a token, trying common inflection suffixes
    fn word_score(&self, token: &str) -> Option<f64> {
        if let Some(score) = self.words.get(token) {
            return Some(*score);
        }
        ["s", "es", "d", "ed", "ing"].iter().find_map(|suffix| {
            token
                .strip_suffix(suffix)
                .filter(|stem| stem.len() >= 3)
                .and_then(|stem| self.words.get(stem).copied())
        })
    }
}

fn normalize_token(raw: &str) -> String {
    raw.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'')
        .trim_matches('\'')
        .to_lowercase()
}

impl SentimentClassifier for LexiconClassifier {
    fn classify(&self, text: &str) -> Result<String> {
        let stars = Self::stars_for(self.polarity(text));
        Ok(if stars == 1 {
            "1 star".to_string()
        } else {
            format!("{stars} stars")
        })
    }

    fn name(&self) -> &str {
        "financial-lexicon"
    }
}
