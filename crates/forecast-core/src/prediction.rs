//! Combined forecast and sentiment response

use crate::forecast::ForecastPoint;
use crate::sentiment::SentimentResult;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Date-keyed prices, ordered by date
pub type PriceSeries = BTreeMap<NaiveDate, f64>;

/// Collect forecast points into a date-keyed series
pub fn to_series(points: &[ForecastPoint]) -> PriceSeries {
    points.iter().map(|p| (p.date, p.price)).collect()
}

/// Original and sentiment-adjusted forecasts for one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedPrediction {
    pub symbol: String,
    pub sentiment: SentimentResult,
    pub original_predictions: PriceSeries,
    pub adjusted_predictions: PriceSeries,
}

impl CombinedPrediction {
    pub fn new(
        symbol: impl Into<String>,
        sentiment: SentimentResult,
        original: &[ForecastPoint],
        adjusted: &[ForecastPoint],
    ) -> Self {
        Self {
            symbol: symbol.into(),
            sentiment,
            original_predictions: to_series(original),
            adjusted_predictions: to_series(adjusted),
        }
    }

    /// Rows of `(date, original, adjusted)` in date order
    pub fn rows(&self) -> impl Iterator<Item = (NaiveDate, f64, Option<f64>)> + '_ {
        self.original_predictions
            .iter()
            .map(|(date, original)| (*date, *original, self.adjusted_predictions.get(date).copied()))
    }
}
