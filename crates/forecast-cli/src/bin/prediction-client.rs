//! Fetch and display a sentiment-adjusted prediction
//!
//! ```bash
//! export SERVICE_BASE_URL="http://127.0.0.1:8080"
//! prediction-client --symbol AMZN --horizon 5
//! ```

use clap::Parser;
use forecast_cli::prompt::{parse_horizon, parse_symbol, prompt_horizon, prompt_symbol};
use forecast_cli::table::{prediction_table, sentiment_line};
use forecast_cli::{ClientConfig, PredictionClient};
use forecast_core::ForecastError;
use forecast_utils::ProcessEnv;
use std::io;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "prediction-client")]
#[command(about = "Compare original and sentiment-adjusted forecasts", long_about = None)]
struct Args {
    /// Ticker symbol; prompted for when omitted
    #[arg(long)]
    symbol: Option<String>,

    /// Days to forecast; prompted for when omitted
    #[arg(long)]
    horizon: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    forecast_utils::init_stderr_tracing("warn");

    let args = Args::parse();
    let config = ClientConfig::from_env(&ProcessEnv)?;
    let client = PredictionClient::new(config)?;

    let (symbol, horizon) = {
        let mut input = io::stdin().lock();
        let mut stdout = io::stdout();

        let symbol = match args.symbol.as_deref().map(parse_symbol) {
            Some(Some(symbol)) => symbol,
            Some(None) => anyhow::bail!("--symbol must not be empty"),
            None => prompt_symbol(&mut input, &mut stdout)?,
        };
        let horizon = match args.horizon.as_deref() {
            Some(raw) => parse_horizon(raw).map_err(anyhow::Error::msg)?,
            None => prompt_horizon(&mut input, &mut stdout)?,
        };
        (symbol, horizon)
    };

    match client.combined_prediction(&symbol, horizon).await {
        Ok(prediction) => {
            println!("{}", sentiment_line(&prediction));
            println!("{}", prediction_table(&prediction));
            Ok(ExitCode::SUCCESS)
        }
        Err(ForecastError::UpstreamError {
            status: Some(status),
            body,
        }) => {
            eprintln!("Request failed with status {status}");
            eprintln!("{body}");
            Ok(ExitCode::FAILURE)
        }
        Err(e) => Err(e.into()),
    }
}
