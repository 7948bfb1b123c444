//! News headlines as sentiment input
//!
//! [`NewsClient`] pulls popular English articles for a query from a
//! NewsAPI-style `/v2/everything` endpoint. [`HeadlineTextSource`] keeps the
//! latest headlines per symbol and hands them to the scorer, falling back to
//! the proxy sentence for symbols it has nothing for.

use forecast_core::{ForecastError, ProxySentenceSource, Result, TextSource};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

const BASE_URL: &str = "https://newsapi.org/v2/everything";

/// Headlines kept per symbol
pub const MAX_HEADLINES: usize = 5;

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// NewsAPI client
#[derive(Debug, Clone)]
pub struct NewsClient {
    client: Client,
    api_key: String,
    base_url: Url,
    rate_limiter: SharedRateLimiter,
}

impl NewsClient {
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

    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    /// Most popular English headlines matching `query`
    pub async fn headlines(&self, query: &str) -> Result<Vec<String>> {
        self.rate_limiter.until_ready().await;

        let response = self
            .client
            .get(self.base_url.clone())
            .query(&[
                ("q", query),
                ("language", "en"),
                ("sortBy", "popularity"),
                ("apiKey", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ForecastError::upstream(format!("news request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ForecastError::upstream_status(status.as_u16(), body));
        }

        let data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ForecastError::upstream(format!("news feed returned invalid JSON: {e}")))?;

        let headlines = parse_headlines(&data)?;
        debug!(query, headlines = headlines.len(), "Fetched headlines");
        Ok(headlines)
    }
}

/// Title and description of each article, at most [`MAX_HEADLINES`]
///
/// A `"status": "error"` body is an upstream error carrying its message.
pub fn parse_headlines(data: &serde_json::Value) -> Result<Vec<String>> {
    if data.get("status").and_then(serde_json::Value::as_str) == Some("error") {
        let message = data
            .get("message")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("unknown error");
        return Err(ForecastError::upstream(format!("news feed: {message}")));
    }

    let articles = data
        .get("articles")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| ForecastError::upstream("missing 'articles' in news response"))?;

    Ok(articles
        .iter()
        .filter_map(|article| {
            let field = |name: &str| {
                article
                    .get(name)
                    .and_then(serde_json::Value::as_str)
                    .map(str::trim)
                    .filter(|text| !text.is_empty())
            };
            match (field("title"), field("description")) {
                (Some(title), Some(description)) => Some(format!("{title}. {description}")),
                (Some(title), None) => Some(title.to_string()),
                (None, Some(description)) => Some(description.to_string()),
                (None, None) => None,
            }
        })
        .take(MAX_HEADLINES)
        .collect())
}

/// [`TextSource`] serving the latest fetched headlines per symbol
#[derive(Debug, Default)]
pub struct HeadlineTextSource {
    texts: RwLock<HashMap<String, String>>,
    fallback: ProxySentenceSource,
}

impl HeadlineTextSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the text for `entity`; an empty list clears it
    pub fn store(&self, entity: &str, headlines: &[String]) {
        let mut texts = self.texts.write().unwrap_or_else(PoisonError::into_inner);
        if headlines.is_empty() {
            texts.remove(entity);
        } else {
            texts.insert(entity.to_string(), headlines.join(" "));
        }
    }

    pub fn has_text(&self, entity: &str) -> bool {
        self.texts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(entity)
    }
}

impl TextSource for HeadlineTextSource {
    fn text_for(&self, entity: &str) -> String {
        let texts = self.texts.read().unwrap_or_else(PoisonError::into_inner);
        match texts.get(entity) {
            Some(text) => text.clone(),
            None => self.fallback.text_for(entity),
        }
    }
}

/// A news client feeding a [`HeadlineTextSource`]
#[derive(Debug, Clone)]
pub struct NewsFeed {
    client: NewsClient,
    texts: Arc<HeadlineTextSource>,
}

impl NewsFeed {
    pub fn new(client: NewsClient) -> Self {
        Self {
            client,
            texts: Arc::new(HeadlineTextSource::new()),
        }
    }

    /// The text source to install on the scorer
    pub fn text_source(&self) -> Arc<HeadlineTextSource> {
        Arc::clone(&self.texts)
    }

    /// Fetch fresh headlines for `symbol`
    ///
    /// Failures keep whatever text was stored before; scoring never waits on
    /// a broken feed.
    pub async fn refresh(&self, symbol: &str) {
        match self.client.headlines(symbol).await {
            Ok(headlines) => self.texts.store(symbol, &headlines),
            Err(e) => warn!(symbol, error = %e, "News refresh failed, keeping previous text"),
        }
    }
}
