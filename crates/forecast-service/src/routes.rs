//! HTTP routes
//!
//! | Route | Response |
//! |-------|----------|
//! | `GET /health` | `{"status": "ok"}` |
//! | `GET /market/daily?symbol&force` | daily series |
//! | `GET /market/predict?symbol&horizon&force` | `{symbol, horizon, prediction, source}` |
//! | `GET /market/sentiment?symbol&force` | `{symbol, sentimentScore, sentimentLabel, source}` |
//! | `GET /market/combined-prediction?symbol&horizon&force` | combined prediction |
//!
//! Errors are `{"error": msg}` with the status from [`status_for`](crate::error::status_for).

use crate::cache::{CacheKey, ResponseCache};
use crate::config::ServiceConfig;
use crate::error::ApiResult;
use crate::news::NewsFeed;
use crate::source::{BarSource, DailySeries};
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Days;
use forecast_core::{
    ForecastError, Pipeline, PriceSeries, Result, SentimentLabel, SentimentResult, SeriesWindow,
    load_window, normalize_symbol, prediction::to_series, validate_horizon,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

/// Header carrying the caller's identifier
pub const CLIENT_ID_HEADER: &str = "x-client-id";

const DEFAULT_HORIZON: i64 = 10;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServiceConfig>,
    pub pipeline: Arc<Pipeline>,
    pub source: Arc<dyn BarSource>,
    pub daily_cache: ResponseCache<DailySeries>,
    pub sentiment_cache: ResponseCache<SentimentPayload>,
    pub news: Option<NewsFeed>,
}

impl AppState {
    pub fn new(config: ServiceConfig, pipeline: Pipeline, source: Arc<dyn BarSource>) -> Self {
        let daily_cache = ResponseCache::new(config.cache_ttl_daily);
        let sentiment_cache = ResponseCache::new(config.cache_ttl_sentiment);
        Self {
            config: Arc::new(config),
            pipeline: Arc::new(pipeline),
            source,
            daily_cache,
            sentiment_cache,
            news: None,
        }
    }

    /// Score sentiment from `feed` headlines instead of the proxy sentence
    pub fn with_news(mut self, feed: NewsFeed) -> Self {
        let pipeline = (*self.pipeline)
            .clone()
            .with_text_source(feed.text_source());
        self.pipeline = Arc::new(pipeline);
        self.news = Some(feed);
        self
    }

    /// Daily series for `symbol`, served from cache unless `force`
    async fn daily(&self, symbol: &str, force: bool) -> Result<DailySeries> {
        let source = Arc::clone(&self.source);
        self.daily_cache
            .get_or_fetch(CacheKey::new(symbol, "daily"), force, || async move {
                source.daily(symbol).await
            })
            .await
    }

    /// Forecast input: bars within `lookback_days` of the latest bar
    async fn window(&self, symbol: &str, force: bool) -> Result<(SeriesWindow, String)> {
        let series = self.daily(symbol, force).await?;
        let to = series
            .bars
            .last()
            .map(|bar| bar.timestamp)
            .ok_or_else(|| ForecastError::upstream(format!("no daily bars for {symbol}")))?;
        let from = to
            .checked_sub_days(Days::new(self.config.lookback_days))
            .unwrap_or(chrono::NaiveDate::MIN);
        let window = load_window(&series.bars, from, to)?;
        Ok((window, series.source))
    }

    /// Sentiment for `symbol`, served from cache unless `force`
    ///
    /// Shared by `/market/sentiment` and `/market/combined-prediction` so
    /// both report the same rating within a TTL.
    async fn sentiment(&self, symbol: &str, force: bool) -> Result<SentimentPayload> {
        let pipeline = Arc::clone(&self.pipeline);
        let news = self.news.clone();
        let symbol = symbol.to_string();
        self.sentiment_cache
            .get_or_fetch(CacheKey::new(symbol.clone(), "sentiment"), force, || async move {
                if let Some(feed) = &news {
                    feed.refresh(&symbol).await;
                }
                let result = pipeline.score_entity(&symbol);
                Ok::<_, ForecastError>(SentimentPayload {
                    symbol,
                    sentiment_score: result.stars(),
                    sentiment_label: result.label(),
                    source: pipeline.scorer().classifier_name().to_string(),
                })
            })
            .await
    }
}

/// Query parameters shared by the market routes
///
/// Kept as strings so malformed values produce a JSON 400 rather than the
/// extractor's plain-text rejection.
#[derive(Debug, Default, Deserialize)]
pub struct MarketQuery {
    pub symbol: Option<String>,
    pub horizon: Option<String>,
    pub force: Option<String>,
}

impl MarketQuery {
    /// Requested symbol, or the default when absent
    fn symbol(&self, default: &str) -> Result<String> {
        match &self.symbol {
            None => Ok(default.to_string()),
            Some(raw) => normalize_symbol(raw),
        }
    }

    fn horizon(&self, max_horizon: usize) -> Result<usize> {
        let horizon = match &self.horizon {
            None => DEFAULT_HORIZON,
            Some(raw) => raw.trim().parse::<i64>().map_err(|_| {
                ForecastError::InvalidInput(format!("horizon must be an integer, got '{raw}'"))
            })?,
        };
        validate_horizon(horizon, max_horizon)
    }

    fn force(&self) -> Result<bool> {
        match self.force.as_deref().map(str::trim) {
            None | Some("" | "false" | "0") => Ok(false),
            Some("true" | "1") => Ok(true),
            Some(other) => Err(ForecastError::InvalidInput(format!(
                "force must be true or false, got '{other}'"
            ))),
        }
    }
}

/// Cached sentiment response body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentPayload {
    pub symbol: String,
    pub sentiment_score: u8,
    pub sentiment_label: SentimentLabel,
    pub source: String,
}

/// Forecast-only response body
#[derive(Debug, Clone, Serialize)]
pub struct PredictPayload {
    pub symbol: String,
    pub horizon: usize,
    pub prediction: PriceSeries,
    pub source: String,
}

fn client_id(headers: &HeaderMap) -> &str {
    headers
        .get(CLIENT_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("anonymous")
}

/// Run CPU-bound pipeline work off the async workers
async fn blocking<T, F>(work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ForecastError::InferenceFailed(format!("forecast task failed: {e}")))?
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn daily(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<MarketQuery>,
) -> ApiResult<Json<DailySeries>> {
    let symbol = query.symbol(&state.config.default_symbol)?;
    let force = query.force()?;
    info!(client = client_id(&headers), symbol = %symbol, force, "GET /market/daily");

    Ok(Json(state.daily(&symbol, force).await?))
}

async fn predict(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<MarketQuery>,
) -> ApiResult<Json<PredictPayload>> {
    let symbol = query.symbol(&state.config.default_symbol)?;
    let horizon = query.horizon(state.pipeline.config().max_horizon)?;
    let force = query.force()?;
    info!(client = client_id(&headers), symbol = %symbol, horizon, "GET /market/predict");

    let (window, source) = state.window(&symbol, force).await?;
    let pipeline = Arc::clone(&state.pipeline);
    let points = blocking(move || pipeline.forecast_window(&window, horizon)).await?;

    Ok(Json(PredictPayload {
        symbol,
        horizon,
        prediction: to_series(&points),
        source,
    }))
}

async fn sentiment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<MarketQuery>,
) -> ApiResult<Json<SentimentPayload>> {
    let symbol = query.symbol(&state.config.default_symbol)?;
    let force = query.force()?;
    info!(client = client_id(&headers), symbol = %symbol, force, "GET /market/sentiment");

    Ok(Json(state.sentiment(&symbol, force).await?))
}

async fn combined_prediction(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<MarketQuery>,
) -> ApiResult<Json<forecast_core::CombinedPrediction>> {
    let symbol = query.symbol(&state.config.default_symbol)?;
    let horizon = query.horizon(state.pipeline.config().max_horizon)?;
    let force = query.force()?;
    info!(
        client = client_id(&headers),
        symbol = %symbol,
        horizon,
        "GET /market/combined-prediction"
    );

    let (window, _) = state.window(&symbol, force).await?;
    let sentiment = SentimentResult::new(state.sentiment(&symbol, force).await?.sentiment_score);
    let pipeline = Arc::clone(&state.pipeline);
    let steps = i64::try_from(horizon)
        .map_err(|_| ForecastError::InvalidInput(format!("horizon {horizon} is too large")))?;
    let prediction = blocking(move || {
        pipeline.combined_with_sentiment(&symbol, &window, steps, sentiment)
    })
    .await?;
    Ok(Json(prediction))
}

/// Build the service router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/market/daily", get(daily))
        .route("/market/predict", get(predict))
        .route("/market/sentiment", get(sentiment))
        .route("/market/combined-prediction", get(combined_prediction))
        .with_state(state)
}
