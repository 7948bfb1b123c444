//! Score one text on the 1-5 star scale
//!
//! ```bash
//! sentiment-score "Company X reported record profits"
//! sentiment-score --entity AMZN
//! ```

use clap::Parser;
use forecast_cli::output::{error_json, sentiment_json};
use forecast_core::{LexiconClassifier, SentimentScorer};
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "sentiment-score")]
#[command(about = "Score text sentiment on a 1-5 star scale", long_about = None)]
struct Args {
    /// Text to score (or an entity name with --entity)
    text: Option<String>,

    /// Treat the argument as an entity and score its proxy sentence
    #[arg(long)]
    entity: bool,
}

fn main() -> ExitCode {
    forecast_utils::init_stderr_tracing("warn");

    let args = Args::parse();
    let Some(text) = args.text else {
        println!("{}", error_json("Missing text argument"));
        return ExitCode::FAILURE;
    };

    let scorer = SentimentScorer::new(Arc::new(LexiconClassifier::new()));
    let result = if args.entity {
        scorer.score_entity(&text)
    } else {
        scorer.score_text(&text)
    };

    println!("{}", sentiment_json(result));
    ExitCode::SUCCESS
}
