//! HTTP client for the combined-prediction endpoint

use crate::retry::RetryPolicy;
use forecast_core::{CombinedPrediction, ForecastError, Result};
use forecast_utils::EnvLookup;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;
use uuid::Uuid;

/// Header naming the caller to the service
pub const CLIENT_ID_HEADER: &str = "X-Client-Id";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Service root without a trailing `/`
    pub base_url: String,

    /// Value sent as `X-Client-Id`
    pub client_id: String,

    /// Per-request timeout
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: &str, client_id: impl Into<String>) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        Url::parse(&base_url).map_err(|e| {
            ForecastError::InvalidInput(format!("SERVICE_BASE_URL '{base_url}' is not a URL: {e}"))
        })?;

        Ok(Self {
            base_url,
            client_id: client_id.into(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Read `SERVICE_BASE_URL` (required) and `CLIENT_ID`
    pub fn from_env(env: &impl EnvLookup) -> Result<Self> {
        let base_url = env.required("SERVICE_BASE_URL")?;
        let client_id = env
            .optional("CLIENT_ID")
            .unwrap_or_else(generated_client_id);
        Self::new(&base_url, client_id)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Full URL of the combined-prediction endpoint
    pub fn combined_prediction_url(&self) -> String {
        format!("{}/market/combined-prediction", self.base_url)
    }
}

/// `client-` followed by 8 hex digits
pub fn generated_client_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("client-{}", &hex[..8])
}

/// Calls the forecast service
#[derive(Debug, Clone)]
pub struct PredictionClient {
    http: Client,
    config: ClientConfig,
    retry: RetryPolicy,
}

impl PredictionClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ForecastError::upstream(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            config,
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Fetch the combined prediction, retrying transport failures and 5xx
    ///
    /// Any other non-200 response is an [`ForecastError::UpstreamError`]
    /// carrying the status and body.
    pub async fn combined_prediction(&self, symbol: &str, horizon: u32) -> Result<CombinedPrediction> {
        info!(
            symbol,
            horizon,
            client_id = %self.config.client_id,
            "Requesting combined prediction"
        );
        self.retry
            .execute("combined-prediction", || self.fetch_once(symbol, horizon))
            .await
    }

    async fn fetch_once(&self, symbol: &str, horizon: u32) -> Result<CombinedPrediction> {
        let horizon = horizon.to_string();
        let response = self
            .http
            .get(self.config.combined_prediction_url())
            .header(CLIENT_ID_HEADER, &self.config.client_id)
            .query(&[("symbol", symbol), ("horizon", horizon.as_str())])
            .send()
            .await
            .map_err(|e| ForecastError::upstream(format!("request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ForecastError::upstream(format!("failed to read response: {e}")))?;
        debug!(status = status.as_u16(), bytes = body.len(), "Response received");

        if !status.is_success() {
            return Err(ForecastError::upstream_status(status.as_u16(), body));
        }
        serde_json::from_str(&body).map_err(|e| {
            ForecastError::upstream_status(status.as_u16(), format!("unparseable body ({e}): {body}"))
        })
    }
}
