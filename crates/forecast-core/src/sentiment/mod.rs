//! Text-to-sentiment scoring on a 1–5 star scale
//!
//! - [`SentimentClassifier`] produces a raw label such as `"4 stars"`
//! - [`SentimentScorer`] truncates input, calls the classifier and parses the
//!   leading digit, degrading to neutral when it cannot
//! - [`TextSource`] turns an entity name into text to score

pub mod classifier;
pub mod scorer;
pub mod text_source;

pub use classifier::{LexiconClassifier, SentimentClassifier};
pub use scorer::{MAX_TEXT_CHARS, SentimentScorer, truncate_chars};
pub use text_source::{ProxySentenceSource, TextSource};

use serde::{Deserialize, Serialize};

/// Star rating used when a classifier label cannot be parsed
pub const NEUTRAL_STARS: u8 = 3;

/// Human-readable sentiment class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SentimentLabel {
    #[serde(rename = "very negative")]
    VeryNegative,
    #[serde(rename = "negative")]
    Negative,
    #[serde(rename = "neutral")]
    Neutral,
    #[serde(rename = "positive")]
    Positive,
    #[serde(rename = "very positive")]
    VeryPositive,
}

impl SentimentLabel {
    /// Label for a star rating; ratings outside 1–5 are clamped
    pub fn from_stars(stars: u8) -> Self {
        match stars {
            0 | 1 => Self::VeryNegative,
            2 => Self::Negative,
            3 => Self::Neutral,
            4 => Self::Positive,
            _ => Self::VeryPositive,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VeryNegative => "very negative",
            Self::Negative => "negative",
            Self::Neutral => "neutral",
            Self::Positive => "positive",
            Self::VeryPositive => "very positive",
        }
    }
}

impl std::fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A star rating in `1..=5` together with its label
///
/// Serialises as `{"label": "positive", "score": 4}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSentiment", into = "RawSentiment")]
pub struct SentimentResult {
    stars: u8,
}

impl SentimentResult {
    /// Rating for `stars`, clamped into `1..=5`
    pub fn new(stars: u8) -> Self {
        Self {
            stars: stars.clamp(1, 5),
        }
    }

    pub fn neutral() -> Self {
        Self {
            stars: NEUTRAL_STARS,
        }
    }

    /// Parse a classifier label whose first character is the star digit
    ///
    /// Anything else yields the neutral rating. This never fails.
    pub fn from_classifier_label(label: &str) -> Self {
        match label.chars().next() {
            Some(c @ '1'..='5') => Self::new(c as u8 - b'0'),
            _ => Self::neutral(),
        }
    }

    pub fn stars(&self) -> u8 {
        self.stars
    }

    pub fn label(&self) -> SentimentLabel {
        SentimentLabel::from_stars(self.stars)
    }

    pub fn is_neutral(&self) -> bool {
        self.stars == NEUTRAL_STARS
    }
}

#[derive(Serialize, Deserialize)]
struct RawSentiment {
    label: SentimentLabel,
    score: u8,
}

impl TryFrom<RawSentiment> for SentimentResult {
    type Error = String;

    fn try_from(raw: RawSentiment) -> std::result::Result<Self, Self::Error> {
        if !(1..=5).contains(&raw.score) {
            return Err(format!("sentiment score {} outside 1-5", raw.score));
        }
        let result = Self { stars: raw.score };
        if result.label() != raw.label {
            return Err(format!(
                "sentiment label '{}' does not match score {}",
                raw.label, raw.score
            ));
        }
        Ok(result)
    }
}

impl From<SentimentResult> for RawSentiment {
    fn from(result: SentimentResult) -> Self {
        Self {
            label: result.label(),
            score: result.stars,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_mapping_is_total() {
        let expected = [
            (1, "very negative"),
            (2, "negative"),
            (3, "neutral"),
            (4, "positive"),
            (5, "very positive"),
        ];
        for (stars, label) in expected {
            assert_eq!(SentimentResult::new(stars).label().as_str(), label);
        }
    }

    #[test]
    fn test_label_parsing() {
        assert_eq!(SentimentResult::from_classifier_label("1 star").stars(), 1);
        assert_eq!(SentimentResult::from_classifier_label("4 stars").stars(), 4);
        assert_eq!(SentimentResult::from_classifier_label("5").stars(), 5);
    }

    #[test]
    fn test_label_fallback_to_neutral() {
        for label in ["", "stars", "POSITIVE", "0 stars", "6 stars", "9", "-1", " 4 stars", "★★★★"] {
            let result = SentimentResult::from_classifier_label(label);
            assert_eq!(result.stars(), 3, "label {label:?}");
            assert_eq!(result.label(), SentimentLabel::Neutral);
        }
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_value(SentimentResult::new(4)).unwrap();
        assert_eq!(json, serde_json::json!({"label": "positive", "score": 4}));

        let parsed: SentimentResult =
            serde_json::from_value(serde_json::json!({"label": "very negative", "score": 1}))
                .unwrap();
        assert_eq!(parsed.stars(), 1);
    }

    #[test]
    fn test_serde_rejects_inconsistent_label() {
        let parsed: std::result::Result<SentimentResult, _> =
            serde_json::from_value(serde_json::json!({"label": "positive", "score": 2}));
        assert!(parsed.is_err());

        let parsed: std::result::Result<SentimentResult, _> =
            serde_json::from_value(serde_json::json!({"label": "neutral", "score": 7}));
        assert!(parsed.is_err());
    }
}
