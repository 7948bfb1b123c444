//! JSON documents printed by the invocation binaries

use forecast_core::{ForecastPoint, SentimentResult, prediction::to_series};
use serde_json::{Value, json};

/// `{"sentimentScore": n, "sentimentLabel": s}`
pub fn sentiment_json(result: SentimentResult) -> Value {
    json!({
        "sentimentScore": result.stars(),
        "sentimentLabel": result.label(),
    })
}

/// `{"YYYY-MM-DD": price, ...}` in date order
pub fn forecast_json(points: &[ForecastPoint]) -> Value {
    json!(to_series(points))
}

/// `{"error": msg}`
pub fn error_json(msg: impl std::fmt::Display) -> Value {
    json!({ "error": msg.to_string() })
}
