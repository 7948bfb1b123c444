//! Sentiment-adjusted price forecasting
//!
//! This crate holds the forecast-sentiment blending pipeline:
//!
//! - **Loader** ([`window`]): cut an inclusive date range out of daily bars
//! - **Forecaster** ([`forecast`]): autoregressive multi-step forecasting with
//!   a transformer encoder loaded once per process
//! - **Scorer** ([`sentiment`]): text or entity to a 1–5 star rating
//! - **Blender** ([`blend`]): scale each forecast point by a sentiment factor
//!
//! [`Pipeline`] wires the four together and produces a
//! [`CombinedPrediction`].
//!
//! # Example
//!
//! ```no_run
//! use forecast_core::{BarSet, LexiconClassifier, Pipeline, PipelineConfig, SeriesWindow};
//! use std::sync::Arc;
//!
//! # fn main() -> forecast_core::Result<()> {
//! let config = PipelineConfig::builder()
//!     .weights_path("model_state.json")
//!     .build()?;
//! let pipeline = Pipeline::from_config(config, Arc::new(LexiconClassifier::new()))?;
//!
//! let bars = BarSet::from_path("data/amzn-daily.json")?;
//! let window = SeriesWindow::new(bars.bars)?;
//! let prediction = pipeline.combined("AMZN", &window, 10)?;
//! println!("{}", serde_json::to_string_pretty(&prediction)?);
//! # Ok(())
//! # }
//! ```

pub mod bar;
pub mod blend;
pub mod config;
pub mod error;
pub mod forecast;
pub mod pipeline;
pub mod prediction;
pub mod sentiment;
pub mod window;

pub use bar::{Bar, BarSet, parse_timestamp};
pub use blend::{BlendPolicy, blend};
pub use config::{MAX_HORIZON, PipelineConfig, PipelineConfigBuilder};
pub use error::{ForecastError, Result};
pub use forecast::{
    DateStep, Device, DevicePreference, ForecastPoint, Forecaster, ModelConfig, ModelHandle,
    ModelWeights, SequenceModel, TransAm,
};
pub use pipeline::{Pipeline, normalize_symbol, validate_horizon};
pub use prediction::{CombinedPrediction, PriceSeries};
pub use sentiment::{
    LexiconClassifier, ProxySentenceSource, SentimentClassifier, SentimentLabel,
    SentimentResult, SentimentScorer, TextSource,
};
pub use window::{SeriesWindow, load_window};
