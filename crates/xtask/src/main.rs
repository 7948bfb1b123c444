//! Project automation tasks for the forecast workspace

use anyhow::Context;
use chrono::{Days, NaiveDate};
use clap::{Parser, Subcommand};
use forecast_core::{Bar, BarSet, ModelConfig, ModelWeights};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Project automation tasks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a seeded, shape-correct weights file (untrained)
    InitWeights {
        #[arg(long, default_value_t = 42)]
        seed: u64,
        #[arg(long, default_value = "model_state.json")]
        out: PathBuf,
        #[arg(long)]
        d_model: Option<usize>,
        #[arg(long)]
        num_heads: Option<usize>,
        #[arg(long)]
        num_layers: Option<usize>,
        #[arg(long)]
        d_ff: Option<usize>,
        #[arg(long)]
        max_len: Option<usize>,
    },
    /// Write a synthetic `{symbol}-daily.json` random walk for local runs
    SampleBars {
        #[arg(long, default_value = "AMZN")]
        symbol: String,
        /// First bar date
        #[arg(long, default_value = "2024-01-01")]
        start: NaiveDate,
        #[arg(long, default_value_t = 365)]
        days: u64,
        #[arg(long, default_value_t = 180.0)]
        start_price: f64,
        #[arg(long, default_value_t = 7)]
        seed: u64,
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,
    },
}

fn random_walk(start: NaiveDate, days: u64, start_price: f64, seed: u64) -> anyhow::Result<Vec<Bar>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut price = start_price;
    (0..days)
        .map(|offset| {
            let date = start
                .checked_add_days(Days::new(offset))
                .context("date out of range")?;
            price = (price * (1.0 + rng.gen_range(-0.02..0.02))).max(1.0);
            Ok(Bar::new(date, (price * 100.0).round() / 100.0))
        })
        .collect()
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::InitWeights {
            seed,
            out,
            d_model,
            num_heads,
            num_layers,
            d_ff,
            max_len,
        } => {
            let defaults = ModelConfig::default();
            let config = ModelConfig {
                d_model: d_model.unwrap_or(defaults.d_model),
                num_heads: num_heads.unwrap_or(defaults.num_heads),
                num_layers: num_layers.unwrap_or(defaults.num_layers),
                d_ff: d_ff.unwrap_or(defaults.d_ff),
                max_len: max_len.unwrap_or(defaults.max_len),
            };
            let weights = ModelWeights::seeded(config, seed)?;
            weights.save(&out)?;
            println!("Wrote {} tensors to {}", weights.tensors.len(), out.display());
            Ok(())
        }
        Commands::SampleBars {
            symbol,
            start,
            days,
            start_price,
            seed,
            data_dir,
        } => {
            let bars = random_walk(start, days, start_price, seed)?;
            std::fs::create_dir_all(&data_dir)?;
            let path = data_dir.join(format!("{}-daily.json", symbol.to_lowercase()));
            let json = serde_json::to_string_pretty(&BarSet { bars })?;
            std::fs::write(&path, json)?;
            println!("Wrote {days} bars to {}", path.display());
            Ok(())
        }
    }
}
