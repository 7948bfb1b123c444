//! HTTP surface for the forecast pipeline
//!
//! Daily bars come from a [`BarSource`](source::BarSource) (local JSON files
//! or Alpha Vantage) behind TTL caches. Forecasts run on the blocking pool.
//! Sentiment scores proxy text unless a [`NewsFeed`](news::NewsFeed) is
//! configured.

pub mod cache;
pub mod config;
pub mod error;
pub mod news;
pub mod routes;
pub mod source;

pub use cache::{CacheKey, ResponseCache};
pub use config::{DataProvider, ServiceConfig, ServiceConfigBuilder};
pub use error::{ApiError, ApiResult, status_for};
pub use news::{HeadlineTextSource, NewsClient, NewsFeed};
pub use routes::{AppState, router};
pub use source::{AlphaVantageClient, AlphaVantageSource, BarSource, DailySeries, LocalFileSource};
