//! Configuration for the forecast service

use forecast_core::{ForecastError, PipelineConfig, Result};
use forecast_utils::EnvLookup;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Where daily bars come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataProvider {
    /// `{data_dir}/{symbol}-daily.json` files
    #[default]
    Local,
    /// Alpha Vantage `TIME_SERIES_DAILY` (requires API key)
    AlphaVantage,
}

impl FromStr for DataProvider {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "alphavantage" | "alpha_vantage" | "alpha-vantage" => Ok(Self::AlphaVantage),
            other => Err(ForecastError::InvalidInput(format!(
                "unknown data provider '{other}' (expected local or alphavantage)"
            ))),
        }
    }
}

/// Service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Listen address
    pub bind_addr: SocketAddr,

    /// Directory holding `{symbol}-daily.json` files
    pub data_dir: PathBuf,

    /// Daily bar provider
    pub provider: DataProvider,

    /// Alpha Vantage API key
    pub alpha_vantage_api_key: Option<String>,

    /// Alpha Vantage requests per minute
    pub rate_limit_per_minute: u32,

    /// NewsAPI key; headlines replace the proxy sentence when set
    pub news_api_key: Option<String>,

    /// Upstream request timeout
    pub request_timeout: Duration,

    /// Symbol used when a request omits one
    pub default_symbol: String,

    /// Days of history before the latest bar fed to the forecaster
    pub lookback_days: u64,

    /// Cache TTL for daily bars
    pub cache_ttl_daily: Duration,

    /// Cache TTL for sentiment results
    pub cache_ttl_sentiment: Duration,

    /// Forecast pipeline settings
    pub pipeline: PipelineConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            data_dir: PathBuf::from("data"),
            provider: DataProvider::Local,
            alpha_vantage_api_key: None,
            rate_limit_per_minute: 5,
            news_api_key: None,
            request_timeout: Duration::from_secs(30),
            default_symbol: "AMZN".to_string(),
            lookback_days: 365,
            cache_ttl_daily: Duration::from_secs(24 * 3600), // 1 day
            cache_ttl_sentiment: Duration::from_secs(6 * 3600), // 6 hours
            pipeline: PipelineConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Create a new configuration builder
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder::default()
    }

    /// Build from `FORECAST_*`, `ALPHA_VANTAGE_API_KEY` and `NEWS_API_KEY`
    pub fn from_env(env: &impl EnvLookup) -> Result<Self> {
        Self::builder().with_env(env)?.build()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.provider == DataProvider::AlphaVantage && self.alpha_vantage_api_key.is_none() {
            return Err(ForecastError::ConfigMissing(
                "ALPHA_VANTAGE_API_KEY (required for the alphavantage provider)".to_string(),
            ));
        }
        if self.rate_limit_per_minute == 0 {
            return Err(ForecastError::InvalidInput(
                "rate_limit_per_minute must be greater than 0".to_string(),
            ));
        }
        if self.default_symbol.trim().is_empty() {
            return Err(ForecastError::InvalidInput(
                "default_symbol must not be empty".to_string(),
            ));
        }
        if self.lookback_days == 0 {
            return Err(ForecastError::InvalidInput(
                "lookback_days must be greater than 0".to_string(),
            ));
        }
        self.pipeline.validate()
    }
}

/// Builder for [`ServiceConfig`]
#[derive(Debug, Default)]
pub struct ServiceConfigBuilder {
    bind_addr: Option<SocketAddr>,
    data_dir: Option<PathBuf>,
    provider: Option<DataProvider>,
    alpha_vantage_api_key: Option<String>,
    rate_limit_per_minute: Option<u32>,
    news_api_key: Option<String>,
    request_timeout: Option<Duration>,
    default_symbol: Option<String>,
    lookback_days: Option<u64>,
    cache_ttl_daily: Option<Duration>,
    cache_ttl_sentiment: Option<Duration>,
    pipeline: Option<PipelineConfig>,
}

impl ServiceConfigBuilder {
    pub fn bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = Some(addr);
        self
    }

    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    pub fn provider(mut self, provider: DataProvider) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn alpha_vantage_api_key(mut self, key: impl Into<String>) -> Self {
        self.alpha_vantage_api_key = Some(key.into());
        self
    }

    pub fn rate_limit_per_minute(mut self, limit: u32) -> Self {
        self.rate_limit_per_minute = Some(limit);
        self
    }

    pub fn news_api_key(mut self, key: impl Into<String>) -> Self {
        self.news_api_key = Some(key.into());
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn default_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.default_symbol = Some(symbol.into());
        self
    }

    pub fn lookback_days(mut self, days: u64) -> Self {
        self.lookback_days = Some(days);
        self
    }

    pub fn cache_ttl_daily(mut self, ttl: Duration) -> Self {
        self.cache_ttl_daily = Some(ttl);
        self
    }

    pub fn cache_ttl_sentiment(mut self, ttl: Duration) -> Self {
        self.cache_ttl_sentiment = Some(ttl);
        self
    }

    pub fn pipeline(mut self, pipeline: PipelineConfig) -> Self {
        self.pipeline = Some(pipeline);
        self
    }

    /// Fill unset fields from the environment
    pub fn with_env(mut self, env: &impl EnvLookup) -> Result<Self> {
        if self.bind_addr.is_none() {
            self.bind_addr = env.parsed("FORECAST_BIND_ADDR")?;
        }
        if self.data_dir.is_none() {
            self.data_dir = env.optional("FORECAST_DATA_DIR").map(PathBuf::from);
        }
        if self.provider.is_none() {
            self.provider = env
                .optional("FORECAST_PROVIDER")
                .map(|raw| raw.parse())
                .transpose()?;
        }
        if self.alpha_vantage_api_key.is_none() {
            self.alpha_vantage_api_key = env.optional("ALPHA_VANTAGE_API_KEY");
        }
        if self.news_api_key.is_none() {
            self.news_api_key = env.optional("NEWS_API_KEY");
        }
        if self.default_symbol.is_none() {
            self.default_symbol = env.optional("FORECAST_DEFAULT_SYMBOL");
        }
        if self.lookback_days.is_none() {
            self.lookback_days = env.parsed("FORECAST_LOOKBACK_DAYS")?;
        }
        if self.pipeline.is_none() {
            self.pipeline = Some(PipelineConfig::builder().with_env(env)?.build()?);
        }
        Ok(self)
    }

    /// Build the configuration
    pub fn build(self) -> Result<ServiceConfig> {
        let defaults = ServiceConfig::default();

        let config = ServiceConfig {
            bind_addr: self.bind_addr.unwrap_or(defaults.bind_addr),
            data_dir: self.data_dir.unwrap_or(defaults.data_dir),
            provider: self.provider.unwrap_or(defaults.provider),
            alpha_vantage_api_key: self.alpha_vantage_api_key,
            rate_limit_per_minute: self
                .rate_limit_per_minute
                .unwrap_or(defaults.rate_limit_per_minute),
            news_api_key: self.news_api_key,
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            default_symbol: self
                .default_symbol
                .map(|s| s.trim().to_uppercase())
                .unwrap_or(defaults.default_symbol),
            lookback_days: self.lookback_days.unwrap_or(defaults.lookback_days),
            cache_ttl_daily: self.cache_ttl_daily.unwrap_or(defaults.cache_ttl_daily),
            cache_ttl_sentiment: self
                .cache_ttl_sentiment
                .unwrap_or(defaults.cache_ttl_sentiment),
            pipeline: self.pipeline.unwrap_or(defaults.pipeline),
        };

        config.validate()?;
        Ok(config)
    }
}
