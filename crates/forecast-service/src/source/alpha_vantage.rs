//! Alpha Vantage daily bars

use super::{BarSource, DailySeries, LocalFileSource};
use async_trait::async_trait;
use chrono::Utc;
use forecast_core::{Bar, ForecastError, Result, parse_timestamp};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

const BASE_URL: &str = "https://www.alphavantage.co/query";
const DAILY_SERIES_KEY: &str = "Time Series (Daily)";

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Alpha Vantage API client
#[derive(Debug, Clone)]
pub struct AlphaVantageClient {
    client: Client,
    api_key: String,
    base_url: Url,
    rate_limiter: SharedRateLimiter,
}

impl AlphaVantageClient {
    /// Create a client allowing `rate_limit` requests per minute
    ///
    /// The free tier allows 5.
    pub fn new(api_key: impl Into<String>, rate_limit: u32, timeout: Duration) -> Result<Self> {
        let quota = Quota::per_minute(NonZeroU32::new(rate_limit).unwrap_or(NonZeroU32::MIN));
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ForecastError::upstream(format!("failed to build HTTP client: {e}")))?;
        let base_url = Url::parse(BASE_URL)
            .map_err(|e| ForecastError::InvalidInput(format!("invalid base URL: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url,
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        })
    }

    /// Point the client at another endpoint
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    /// Daily closes for `symbol`, oldest first
    pub async fn get_daily(&self, symbol: &str) -> Result<Vec<Bar>> {
        // Wait for rate limiter
        self.rate_limiter.until_ready().await;

        let response = self
            .client
            .get(self.base_url.clone())
            .query(&[
                ("function", "TIME_SERIES_DAILY"),
                ("outputsize", "compact"),
                ("symbol", symbol),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ForecastError::upstream(format!("Alpha Vantage request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ForecastError::upstream_status(status.as_u16(), body));
        }

        let data: serde_json::Value = response.json().await.map_err(|e| {
            ForecastError::upstream(format!("Alpha Vantage returned invalid JSON: {e}"))
        })?;

        let bars = parse_daily(&data)?;
        debug!(symbol, bars = bars.len(), "Fetched daily series");
        Ok(bars)
    }
}

/// Extract `"4. close"` per date from a `TIME_SERIES_DAILY` response
///
/// `Error Message`, `Note` (rate limit) and `Information` (premium
/// endpoint) bodies are upstream errors.
pub fn parse_daily(data: &serde_json::Value) -> Result<Vec<Bar>> {
    for field in ["Error Message", "Note", "Information"] {
        if let Some(message) = data.get(field).and_then(serde_json::Value::as_str) {
            return Err(ForecastError::upstream(format!("Alpha Vantage: {message}")));
        }
    }

    let series = data
        .get(DAILY_SERIES_KEY)
        .and_then(serde_json::Value::as_object)
        .filter(|series| !series.is_empty())
        .ok_or_else(|| {
            let fields: Vec<&str> = data
                .as_object()
                .map(|obj| obj.keys().map(String::as_str).collect())
                .unwrap_or_default();
            ForecastError::upstream(format!(
                "missing '{DAILY_SERIES_KEY}' in response (fields: {})",
                fields.join(", ")
            ))
        })?;

    let mut bars = series
        .iter()
        .map(|(date, values)| {
            let timestamp = parse_timestamp(date)
                .map_err(|_| ForecastError::upstream(format!("bad date '{date}' in series")))?;
            let close = values
                .get("4. close")
                .and_then(serde_json::Value::as_str)
                .and_then(|raw| raw.parse::<f64>().ok())
                .filter(|close| close.is_finite())
                .ok_or_else(|| ForecastError::upstream(format!("missing close for {date}")))?;
            Ok(Bar::new(timestamp, close))
        })
        .collect::<Result<Vec<_>>>()?;

    bars.sort_by_key(|bar| bar.timestamp);
    Ok(bars)
}

/// [`BarSource`] over Alpha Vantage, optionally persisting each fetch
#[derive(Debug, Clone)]
pub struct AlphaVantageSource {
    client: AlphaVantageClient,
    store: Option<LocalFileSource>,
}

impl AlphaVantageSource {
    pub fn new(client: AlphaVantageClient) -> Self {
        Self {
            client,
            store: None,
        }
    }

    /// Write every fetched series under the store's data directory
    pub fn with_store(mut self, store: LocalFileSource) -> Self {
        self.store = Some(store);
        self
    }
}

#[async_trait]
impl BarSource for AlphaVantageSource {
    async fn daily(&self, symbol: &str) -> Result<DailySeries> {
        let bars = self.client.get_daily(symbol).await?;
        let series = DailySeries {
            symbol: symbol.to_uppercase(),
            as_of_iso: Utc::now().to_rfc3339(),
            source: "alphavantage: TIME_SERIES_DAILY".to_string(),
            bars,
        };

        if let Some(store) = &self.store {
            if let Err(e) = store.store(&series).await {
                warn!(symbol, error = %e, "Failed to persist daily series");
            }
        }
        Ok(series)
    }

    fn name(&self) -> &str {
        "alphavantage"
    }
}
