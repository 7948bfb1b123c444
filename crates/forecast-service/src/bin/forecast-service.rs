//! Forecast HTTP service

use anyhow::Context;
use clap::Parser;
use forecast_core::{LexiconClassifier, Pipeline};
use forecast_service::{
    AlphaVantageClient, AlphaVantageSource, AppState, BarSource, DataProvider, LocalFileSource,
    NewsClient, NewsFeed, ServiceConfig, router,
};
use forecast_utils::ProcessEnv;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "forecast-service")]
#[command(about = "Serve forecasts, sentiment and sentiment-adjusted predictions", long_about = None)]
struct Args {
    /// Listen address (overrides FORECAST_BIND_ADDR)
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Directory of `{symbol}-daily.json` files (overrides FORECAST_DATA_DIR)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// `local` or `alphavantage` (overrides FORECAST_PROVIDER)
    #[arg(long)]
    provider: Option<DataProvider>,

    /// Model weights file (overrides FORECAST_WEIGHTS)
    #[arg(long)]
    weights: Option<PathBuf>,
}

fn bar_source(config: &ServiceConfig) -> anyhow::Result<Arc<dyn BarSource>> {
    let local = LocalFileSource::new(&config.data_dir);
    match config.provider {
        DataProvider::Local => Ok(Arc::new(local)),
        DataProvider::AlphaVantage => {
            let key = config
                .alpha_vantage_api_key
                .clone()
                .context("ALPHA_VANTAGE_API_KEY is not set")?;
            let client = AlphaVantageClient::new(
                key,
                config.rate_limit_per_minute,
                config.request_timeout,
            )?;
            Ok(Arc::new(AlphaVantageSource::new(client).with_store(local)))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    forecast_utils::init_tracing("info,forecast_core=info,forecast_service=info");

    let args = Args::parse();

    let mut config = ServiceConfig::from_env(&ProcessEnv).context("invalid configuration")?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }
    if let Some(provider) = args.provider {
        config.provider = provider;
    }
    if let Some(weights) = args.weights {
        config.pipeline.weights_path = weights;
    }
    config.validate().context("invalid configuration")?;

    let source = bar_source(&config)?;
    let pipeline = Pipeline::from_config(config.pipeline.clone(), Arc::new(LexiconClassifier::new()))?;
    pipeline.load_model().with_context(|| {
        format!(
            "failed to load model from {}",
            config.pipeline.weights_path.display()
        )
    })?;

    info!(
        addr = %config.bind_addr,
        provider = source.name(),
        weights = %config.pipeline.weights_path.display(),
        "Starting forecast-service"
    );

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    let news = match &config.news_api_key {
        Some(key) => Some(NewsFeed::new(NewsClient::new(
            key.clone(),
            config.rate_limit_per_minute,
            config.request_timeout,
        )?)),
        None => None,
    };
    info!(enabled = news.is_some(), "News headlines");

    let mut state = AppState::new(config, pipeline, source);
    if let Some(feed) = news {
        state = state.with_news(feed);
    }
    let app = router(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
