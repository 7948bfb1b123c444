//! Daily bars and the input dataset envelope

use crate::error::{ForecastError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

/// One daily close
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Trading date
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: NaiveDate,
    /// Closing price
    pub close: f64,
}

impl Bar {
    /// Create a new bar
    pub fn new(timestamp: NaiveDate, close: f64) -> Self {
        Self { timestamp, close }
    }
}

/// Input dataset: `{"bars": [{"timestamp": ..., "close": ...}, ...]}`
///
/// Any other top-level or per-bar fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BarSet {
    pub bars: Vec<Bar>,
}

impl BarSet {
    /// Parse a dataset from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a dataset from a JSON file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            ForecastError::InvalidInput(format!("cannot read bars from {}: {e}", path.display()))
        })?;
        Self::from_json_str(&json)
    }
}

/// Parse an ISO-8601 date or datetime into its calendar date
///
/// Accepts `2025-01-02`, RFC 3339 (`2025-01-02T14:30:00Z`,
/// `2025-01-02T14:30:00-05:00`) and naive datetimes (`2025-01-02T14:30:00`,
/// `2025-01-02 14:30:00`). Offsets are not normalised: the date as written
/// is kept.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDate> {
    let s = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.date_naive());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(dt.date());
        }
    }
    Err(ForecastError::InvalidInput(format!(
        "unrecognised timestamp '{raw}'"
    )))
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> std::result::Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert_eq!(parse_timestamp("2025-01-02").unwrap(), date(2025, 1, 2));
        assert_eq!(
            parse_timestamp("2025-01-02T14:30:00Z").unwrap(),
            date(2025, 1, 2)
        );
        assert_eq!(
            parse_timestamp("2025-01-02T23:30:00-05:00").unwrap(),
            date(2025, 1, 2)
        );
        assert_eq!(
            parse_timestamp("2025-01-02T00:00:00.000").unwrap(),
            date(2025, 1, 2)
        );
        assert_eq!(
            parse_timestamp("2025-01-02 09:30:00").unwrap(),
            date(2025, 1, 2)
        );
        assert!(parse_timestamp("01/02/2025").is_err());
    }

    #[test]
    fn test_bar_set_ignores_extra_fields() {
        let json = r#"{
            "symbol": "AMZN",
            "source": "alphavantage",
            "bars": [
                {"timestamp": "2025-01-02", "open": 1.0, "close": 220.22, "volume": 10},
                {"timestamp": "2025-01-03T00:00:00Z", "close": 224.19}
            ]
        }"#;

        let set = BarSet::from_json_str(json).unwrap();
        assert_eq!(set.bars.len(), 2);
        assert_eq!(set.bars[0], Bar::new(date(2025, 1, 2), 220.22));
        assert_eq!(set.bars[1].timestamp, date(2025, 1, 3));
    }

    #[test]
    fn test_bar_set_rejects_bad_timestamp() {
        let json = r#"{"bars": [{"timestamp": "yesterday", "close": 1.0}]}"#;
        assert!(matches!(
            BarSet::from_json_str(json),
            Err(ForecastError::Json(_))
        ));
    }

    #[test]
    fn test_bar_serializes_plain_date() {
        let bar = Bar::new(date(2025, 3, 4), 10.5);
        let json = serde_json::to_value(bar).unwrap();
        assert_eq!(json["timestamp"], "2025-03-04");
    }

    #[test]
    fn test_bar_set_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("amzn-daily.json");
        std::fs::write(&path, r#"{"bars": [{"timestamp": "2025-01-02", "close": 1.5}]}"#)
            .unwrap();

        let set = BarSet::from_path(&path).unwrap();
        assert_eq!(set.bars.len(), 1);

        let missing = BarSet::from_path(dir.path().join("nope.json"));
        assert!(matches!(missing, Err(ForecastError::InvalidInput(_))));
    }
}
