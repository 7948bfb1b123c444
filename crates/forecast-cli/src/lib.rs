//! Command-line surfaces for the forecast pipeline
//!
//! - `sentiment-score`: score one text (or entity) and print JSON
//! - `forecast`: forecast closes from a bars file and print `{date: price}`
//! - `prediction-client`: call the service's combined-prediction endpoint
//!   and print a comparison table

pub mod client;
pub mod output;
pub mod prompt;
pub mod retry;
pub mod table;

pub use client::{ClientConfig, PredictionClient};
pub use retry::RetryPolicy;
