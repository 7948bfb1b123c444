//! Daily bar providers

pub mod alpha_vantage;
pub mod local;

pub use alpha_vantage::{AlphaVantageClient, AlphaVantageSource};
pub use local::LocalFileSource;

use async_trait::async_trait;
use forecast_core::{Bar, Result};
use serde::{Deserialize, Serialize};

/// A symbol's daily closes with provenance
///
/// The `bars` field makes this a valid input dataset on its own, so stored
/// series can be fed straight back to the forecaster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySeries {
    #[serde(default)]
    pub symbol: String,
    /// When the series was fetched, RFC 3339
    #[serde(default)]
    pub as_of_iso: String,
    /// Where the series came from
    #[serde(default)]
    pub source: String,
    pub bars: Vec<Bar>,
}

/// Provider of daily bars for a symbol
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BarSource: Send + Sync {
    /// Daily bars for `symbol`, oldest first
    async fn daily(&self, symbol: &str) -> Result<DailySeries>;

    /// Provider name for logs
    fn name(&self) -> &str;
}
