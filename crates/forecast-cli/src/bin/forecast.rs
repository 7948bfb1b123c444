//! Forecast future closes from a daily bars file
//!
//! ```bash
//! forecast AMZN 2024-01-01 2024-12-31 --future-steps 5
//! # {"2025-01-01":219.4,...}
//! ```
//!
//! Bars default to `data/{symbol}-daily.json`; weights to `FORECAST_WEIGHTS`
//! or `model_state.json`.

use chrono::NaiveDate;
use clap::Parser;
use forecast_cli::output::{error_json, forecast_json};
use forecast_core::{BarSet, LexiconClassifier, Pipeline, PipelineConfig};
use forecast_utils::ProcessEnv;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "forecast")]
#[command(about = "Forecast daily closes after a date range", long_about = None)]
struct Args {
    /// Ticker symbol
    symbol: String,

    /// First bar date (inclusive)
    from: NaiveDate,

    /// Last bar date (inclusive)
    to: NaiveDate,

    /// Bars fed to the model per step
    #[arg(long)]
    input_window: Option<usize>,

    /// Number of future closes to produce
    #[arg(long)]
    future_steps: Option<usize>,

    /// Bars dataset `{"bars": [...]}`
    #[arg(long)]
    bars: Option<PathBuf>,

    /// Model weights file
    #[arg(long)]
    weights: Option<PathBuf>,
}

fn run(args: Args) -> anyhow::Result<serde_json::Value> {
    let mut builder = PipelineConfig::builder();
    if let Some(input_window) = args.input_window {
        builder = builder.input_window(input_window);
    }
    if let Some(future_steps) = args.future_steps {
        builder = builder.future_steps(future_steps);
    }
    if let Some(weights) = args.weights {
        builder = builder.weights_path(weights);
    }
    let config = builder.with_env(&ProcessEnv)?.build()?;
    let future_steps = config.future_steps;

    let bars_path = args.bars.unwrap_or_else(|| {
        PathBuf::from("data").join(format!("{}-daily.json", args.symbol.trim().to_lowercase()))
    });
    let bars = BarSet::from_path(&bars_path)?;
    info!(
        symbol = %args.symbol,
        bars = bars.bars.len(),
        path = %bars_path.display(),
        "Loaded bars"
    );

    let pipeline = Pipeline::from_config(config, Arc::new(LexiconClassifier::new()))?;
    let points = pipeline.forecast(&bars.bars, args.from, args.to, future_steps)?;
    Ok(forecast_json(&points))
}

fn main() -> ExitCode {
    forecast_utils::init_stderr_tracing("warn");

    match run(Args::parse()) {
        Ok(value) => {
            println!("{value}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("{}", error_json(e));
            ExitCode::FAILURE
        }
    }
}
