//! End-to-end forecast, score and blend

use crate::bar::Bar;
use crate::config::PipelineConfig;
use crate::error::{ForecastError, Result};
use crate::forecast::{ForecastPoint, Forecaster, ModelHandle};
use crate::prediction::CombinedPrediction;
use crate::sentiment::{SentimentClassifier, SentimentResult, SentimentScorer, TextSource};
use crate::window::{SeriesWindow, load_window};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{info, instrument};

/// Check a requested horizon against `1..=max_horizon` and convert it to a
/// step count
pub fn validate_horizon(horizon: i64, max_horizon: usize) -> Result<usize> {
    if horizon <= 0 {
        return Err(ForecastError::InvalidInput(format!(
            "horizon must be a positive integer, got {horizon}"
        )));
    }
    match usize::try_from(horizon) {
        Ok(steps) if steps <= max_horizon => Ok(steps),
        _ => Err(ForecastError::InvalidInput(format!(
            "horizon {horizon} exceeds the maximum of {max_horizon}"
        ))),
    }
}

/// Trim and upper-case a ticker symbol, rejecting blanks
pub fn normalize_symbol(raw: &str) -> Result<String> {
    let symbol = raw.trim();
    if symbol.is_empty() {
        return Err(ForecastError::InvalidInput(
            "symbol must not be empty".to_string(),
        ));
    }
    Ok(symbol.to_uppercase())
}

/// Forecaster, scorer and blend policy wired together
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    forecaster: Forecaster,
    scorer: SentimentScorer,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, forecaster: Forecaster, scorer: SentimentScorer) -> Self {
        Self {
            config,
            forecaster,
            scorer,
        }
    }

    /// Pipeline whose model loads lazily from `config.weights_path`
    pub fn from_config(
        config: PipelineConfig,
        classifier: Arc<dyn SentimentClassifier>,
    ) -> Result<Self> {
        config.validate()?;
        let handle = Arc::new(ModelHandle::from_weights_path(
            config.weights_path.clone(),
            config.device,
        ));
        let forecaster = Forecaster::new(handle, config.date_step);
        let scorer = SentimentScorer::new(classifier).with_max_chars(config.max_text_chars);
        Ok(Self::new(config, forecaster, scorer))
    }

    /// Score entities with text from `text_source`
    pub fn with_text_source(mut self, text_source: Arc<dyn TextSource>) -> Self {
        self.scorer = self.scorer.with_text_source(text_source);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn scorer(&self) -> &SentimentScorer {
        &self.scorer
    }

    /// Load the model eagerly
    ///
    /// A failure here is final: later forecasts return the same error.
    pub fn load_model(&self) -> Result<()> {
        self.forecaster.load_model()
    }

    /// Forecast `future_steps` closes after the bars dated `from..=to`
    pub fn forecast(
        &self,
        bars: &[Bar],
        from: NaiveDate,
        to: NaiveDate,
        future_steps: usize,
    ) -> Result<Vec<ForecastPoint>> {
        let window = load_window(bars, from, to)?;
        self.forecast_window(&window, future_steps)
    }

    /// Forecast `future_steps` closes after the window
    ///
    /// Step counts above `max_horizon` are rejected before the model loads.
    pub fn forecast_window(
        &self,
        window: &SeriesWindow,
        future_steps: usize,
    ) -> Result<Vec<ForecastPoint>> {
        if future_steps > self.config.max_horizon {
            return Err(ForecastError::InvalidInput(format!(
                "horizon {future_steps} exceeds the maximum of {}",
                self.config.max_horizon
            )));
        }
        self.forecaster
            .forecast(window, self.config.input_window, future_steps)
    }

    pub fn score_text(&self, text: &str) -> SentimentResult {
        self.scorer.score_text(text)
    }

    pub fn score_entity(&self, entity: &str) -> SentimentResult {
        self.scorer.score_entity(entity)
    }

    /// Forecast, score the symbol and blend
    ///
    /// Symbol and horizon are checked before the model is touched.
    #[instrument(skip(self, window), fields(bars = window.len()))]
    pub fn combined(
        &self,
        symbol: &str,
        window: &SeriesWindow,
        horizon: i64,
    ) -> Result<CombinedPrediction> {
        let symbol = normalize_symbol(symbol)?;
        let steps = validate_horizon(horizon, self.config.max_horizon)?;

        let original = self.forecast_window(window, steps)?;
        let sentiment = self.score_entity(&symbol);
        Ok(self.blend(symbol, steps, &original, sentiment))
    }

    /// Like [`combined`](Self::combined) with a sentiment scored elsewhere
    #[instrument(skip(self, window), fields(bars = window.len()))]
    pub fn combined_with_sentiment(
        &self,
        symbol: &str,
        window: &SeriesWindow,
        horizon: i64,
        sentiment: SentimentResult,
    ) -> Result<CombinedPrediction> {
        let symbol = normalize_symbol(symbol)?;
        let steps = validate_horizon(horizon, self.config.max_horizon)?;

        let original = self.forecast_window(window, steps)?;
        Ok(self.blend(symbol, steps, &original, sentiment))
    }

    fn blend(
        &self,
        symbol: String,
        steps: usize,
        original: &[ForecastPoint],
        sentiment: SentimentResult,
    ) -> CombinedPrediction {
        let adjusted = self.config.blend.apply(original, sentiment);

        info!(
            symbol = %symbol,
            steps,
            stars = sentiment.stars(),
            "Combined prediction ready"
        );
        CombinedPrediction::new(symbol, sentiment, original, &adjusted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::DateStep;
    use crate::forecast::model::{MockSequenceModel, SequenceModel};
    use crate::sentiment::LexiconClassifier;
    use crate::sentiment::classifier::MockSentimentClassifier;

    fn bars(count: usize) -> Vec<Bar> {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        (0..count)
            .map(|i| Bar::new(start + chrono::Days::new(i as u64), 100.0 + i as f64))
            .collect()
    }

    fn pipeline_with(model: MockSequenceModel, classifier: MockSentimentClassifier) -> Pipeline {
        let model: Arc<dyn SequenceModel> = Arc::new(model);
        let forecaster = Forecaster::new(Arc::new(ModelHandle::ready(model)), DateStep::Calendar);
        Pipeline::new(
            PipelineConfig::default(),
            forecaster,
            SentimentScorer::new(Arc::new(classifier)),
        )
    }

    fn flat_model() -> MockSequenceModel {
        let mut model = MockSequenceModel::new();
        model.expect_name().return_const("mock".to_string());
        model.expect_max_input_len().return_const(None::<usize>);
        model.expect_predict_next().returning(|_| Ok(vec![0.5]));
        model
    }

    fn classifier(label: &'static str) -> MockSentimentClassifier {
        let mut classifier = MockSentimentClassifier::new();
        classifier.expect_name().return_const("mock".to_string());
        classifier
            .expect_classify()
            .returning(move |_| Ok(label.to_string()));
        classifier
    }

    #[test]
    fn test_validate_horizon() {
        assert_eq!(validate_horizon(10, 365).unwrap(), 10);
        assert_eq!(validate_horizon(365, 365).unwrap(), 365);
        assert!(matches!(validate_horizon(0, 365), Err(ForecastError::InvalidInput(_))));
        assert!(matches!(validate_horizon(-3, 365), Err(ForecastError::InvalidInput(_))));
        assert!(matches!(validate_horizon(366, 365), Err(ForecastError::InvalidInput(_))));
        assert!(matches!(
            validate_horizon(i64::MAX, 365),
            Err(ForecastError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_normalize_symbol() {
        assert_eq!(normalize_symbol(" amzn ").unwrap(), "AMZN");
        assert!(normalize_symbol("   ").is_err());
    }

    #[test]
    fn test_bad_horizon_never_reaches_model() {
        let mut model = MockSequenceModel::new();
        model.expect_name().return_const("mock".to_string());
        model.expect_predict_next().times(0);
        model.expect_max_input_len().times(0);
        let mut scorer = MockSentimentClassifier::new();
        scorer.expect_classify().times(0);
        scorer.expect_name().return_const("mock".to_string());

        let pipeline = pipeline_with(model, scorer);
        let window = SeriesWindow::new(bars(40)).unwrap();
        for horizon in [0, -1, -100, 366, 1 << 40, i64::MAX] {
            assert!(matches!(
                pipeline.combined("AMZN", &window, horizon),
                Err(ForecastError::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn test_oversized_forecast_never_reaches_model() {
        let mut model = MockSequenceModel::new();
        model.expect_name().return_const("mock".to_string());
        model.expect_predict_next().times(0);
        model.expect_max_input_len().times(0);
        let pipeline = pipeline_with(model, classifier("3 stars"));
        let window = SeriesWindow::new(bars(40)).unwrap();

        assert!(matches!(
            pipeline.forecast_window(&window, 1 << 40),
            Err(ForecastError::InvalidInput(_))
        ));
        assert!(matches!(
            pipeline.forecast_window(&window, usize::MAX),
            Err(ForecastError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_combined_positive_sentiment() {
        let pipeline = pipeline_with(flat_model(), classifier("5 stars"));
        let window = SeriesWindow::new(bars(40)).unwrap();

        let prediction = pipeline.combined("amzn", &window, 5).unwrap();

        assert_eq!(prediction.symbol, "AMZN");
        assert_eq!(prediction.sentiment.stars(), 5);
        assert_eq!(prediction.original_predictions.len(), 5);
        assert_eq!(
            prediction.original_predictions.keys().collect::<Vec<_>>(),
            prediction.adjusted_predictions.keys().collect::<Vec<_>>()
        );
        for (date, original) in &prediction.original_predictions {
            assert!(prediction.adjusted_predictions[date] > *original);
        }
    }

    #[test]
    fn test_combined_neutral_is_identity() {
        let pipeline = pipeline_with(flat_model(), classifier("3 stars"));
        let window = SeriesWindow::new(bars(40)).unwrap();
        let prediction = pipeline.combined("MSFT", &window, 10).unwrap();
        assert_eq!(prediction.original_predictions, prediction.adjusted_predictions);
    }

    #[test]
    fn test_combined_with_given_sentiment_skips_classifier() {
        let mut scorer = MockSentimentClassifier::new();
        scorer.expect_classify().times(0);
        scorer.expect_name().return_const("mock".to_string());
        let pipeline = pipeline_with(flat_model(), scorer);
        let window = SeriesWindow::new(bars(40)).unwrap();

        let prediction = pipeline
            .combined_with_sentiment("amzn", &window, 4, SentimentResult::new(1))
            .unwrap();

        assert_eq!(prediction.symbol, "AMZN");
        assert_eq!(prediction.sentiment.stars(), 1);
        assert_eq!(prediction.adjusted_predictions.len(), 4);
        for (date, original) in &prediction.original_predictions {
            assert!(prediction.adjusted_predictions[date] < *original);
        }
    }

    #[test]
    fn test_forecast_over_range() {
        let pipeline = pipeline_with(flat_model(), classifier("3 stars"));
        let all = bars(90);
        let from = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let to = NaiveDate::from_ymd_opt(2025, 2, 28).unwrap();

        let points = pipeline.forecast(&all, from, to, 10).unwrap();
        assert_eq!(points.len(), 10);
        assert_eq!(points[0].date, NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());

        let short_to = NaiveDate::from_ymd_opt(2025, 1, 30).unwrap();
        assert!(matches!(
            pipeline.forecast(&all, from, short_to, 10),
            Err(ForecastError::InsufficientHistory {
                required: 30,
                actual: 16
            })
        ));
    }

    #[test]
    fn test_eager_load_failure_is_final() {
        let config = PipelineConfig::builder()
            .weights_path("/nonexistent/weights.json")
            .build()
            .unwrap();
        let pipeline = Pipeline::from_config(config, Arc::new(LexiconClassifier::new())).unwrap();

        assert!(matches!(pipeline.load_model(), Err(ForecastError::ModelLoadFailure(_))));
        let window = SeriesWindow::new(bars(40)).unwrap();
        assert!(matches!(
            pipeline.forecast_window(&window, 3),
            Err(ForecastError::ModelLoadFailure(_))
        ));
    }

    #[test]
    fn test_from_config_defers_model_load() {
        let config = PipelineConfig::builder()
            .weights_path("/nonexistent/weights.json")
            .build()
            .unwrap();
        let pipeline = Pipeline::from_config(config, Arc::new(LexiconClassifier::new())).unwrap();

        assert_eq!(pipeline.score_entity("AMZN").stars(), 3);
        let window = SeriesWindow::new(bars(40)).unwrap();
        assert!(matches!(
            pipeline.combined("AMZN", &window, 3),
            Err(ForecastError::ModelLoadFailure(_))
        ));
    }
}
