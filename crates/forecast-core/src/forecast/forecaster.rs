//! Autoregressive multi-step forecasting

use super::calendar::DateStep;
use super::handle::ModelHandle;
use super::scaler::MinMaxScaler;
use crate::error::{ForecastError, Result};
use crate::window::SeriesWindow;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

/// One forecast value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub price: f64,
}

/// Rolls a sequence model forward over a series window
#[derive(Debug, Clone)]
pub struct Forecaster {
    model: Arc<ModelHandle>,
    date_step: DateStep,
}

impl Forecaster {
    pub fn new(model: Arc<ModelHandle>, date_step: DateStep) -> Self {
        Self { model, date_step }
    }

    pub fn date_step(&self) -> DateStep {
        self.date_step
    }

    /// Bind the model now instead of on the first forecast
    pub fn load_model(&self) -> Result<()> {
        self.model.get().map(|_| ())
    }

    /// Forecast `future_steps` closes following the window
    ///
    /// The last `input_window` closes seed the model. Each call's output is
    /// appended to the working sequence before the next call, and any surplus
    /// from the final call is dropped. Values are min-max scaled on the whole
    /// window before inference and mapped back afterwards.
    #[instrument(skip(self, window), fields(bars = window.len()))]
    pub fn forecast(
        &self,
        window: &SeriesWindow,
        input_window: usize,
        future_steps: usize,
    ) -> Result<Vec<ForecastPoint>> {
        if input_window == 0 {
            return Err(ForecastError::InvalidInput(
                "input_window must be positive".to_string(),
            ));
        }
        if future_steps == 0 {
            return Err(ForecastError::InvalidInput(
                "future_steps must be positive".to_string(),
            ));
        }
        if window.len() < input_window {
            return Err(ForecastError::InsufficientHistory {
                required: input_window,
                actual: window.len(),
            });
        }
        let last_date = window
            .last_date()
            .ok_or_else(|| ForecastError::InvalidInput("empty series window".to_string()))?;
        let dates = self.date_step.dates_after(last_date, future_steps)?;

        let closes = window.closes();
        let scaler = MinMaxScaler::fit(&closes)?;

        let model = self.model.get()?;
        match model.max_input_len() {
            Some(max) if input_window > max => {
                return Err(ForecastError::InvalidInput(format!(
                    "input_window {input_window} exceeds model limit {max}"
                )));
            }
            _ => {}
        }

        let mut working = scaler.transform_all(&closes[closes.len() - input_window..]);
        let mut produced = Vec::new();
        let mut calls = 0usize;

        while produced.len() < future_steps {
            let context = &working[working.len() - input_window..];
            let emitted = model.predict_next(context)?;
            calls += 1;
            if emitted.is_empty() {
                return Err(ForecastError::InferenceFailed(format!(
                    "{} emitted no values",
                    model.name()
                )));
            }
            if let Some(bad) = emitted.iter().find(|v| !v.is_finite()) {
                return Err(ForecastError::InferenceFailed(format!(
                    "{} emitted non-finite value {bad}",
                    model.name()
                )));
            }
            working.extend_from_slice(&emitted);
            produced.extend_from_slice(&emitted);
        }
        produced.truncate(future_steps);

        debug!(model = model.name(), calls, steps = future_steps, "Forecast complete");

        Ok(dates
            .into_iter()
            .zip(produced)
            .map(|(date, scaled)| ForecastPoint {
                date,
                price: scaler.inverse(scaled),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bar::Bar;
    use crate::forecast::device::Device;
    use crate::forecast::model::{MockSequenceModel, SequenceModel, TransAm};
    use crate::forecast::weights::{ModelConfig, ModelWeights};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn series(count: usize) -> SeriesWindow {
        let start = date(2025, 1, 1);
        let bars = (0..count)
            .map(|i| {
                let t = i as f64;
                Bar::new(
                    start + chrono::Days::new(i as u64),
                    200.0 + 5.0 * (t / 4.0).sin() + 0.3 * t,
                )
            })
            .collect();
        SeriesWindow::new(bars).unwrap()
    }

    fn forecaster_with(mock: MockSequenceModel) -> Forecaster {
        Forecaster::new(
            Arc::new(ModelHandle::ready(Arc::new(mock))),
            DateStep::Calendar,
        )
    }

    fn named_mock() -> MockSequenceModel {
        let mut mock = MockSequenceModel::new();
        mock.expect_name().return_const("mock".to_string());
        mock.expect_max_input_len().return_const(None::<usize>);
        mock
    }

    fn transam_forecaster(device: Device) -> Forecaster {
        let weights = ModelWeights::seeded(ModelConfig::default(), 11).unwrap();
        let model: Arc<dyn SequenceModel> =
            Arc::new(TransAm::from_weights(&weights, device).unwrap());
        Forecaster::new(Arc::new(ModelHandle::ready(model)), DateStep::Calendar)
    }

    #[test]
    fn test_insufficient_history_skips_model() {
        let mut mock = named_mock();
        mock.expect_predict_next().times(0);
        let forecaster = forecaster_with(mock);

        match forecaster.forecast(&series(20), 30, 10) {
            Err(ForecastError::InsufficientHistory { required, actual }) => {
                assert_eq!(required, 30);
                assert_eq!(actual, 20);
            }
            other => panic!("Expected InsufficientHistory, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_steps_or_window_rejected() {
        let mut mock = named_mock();
        mock.expect_predict_next().times(0);
        let forecaster = forecaster_with(mock);

        assert!(matches!(
            forecaster.forecast(&series(40), 30, 0),
            Err(ForecastError::InvalidInput(_))
        ));
        assert!(matches!(
            forecaster.forecast(&series(40), 0, 10),
            Err(ForecastError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_one_value_per_call() {
        let mut mock = named_mock();
        mock.expect_predict_next()
            .withf(|input| input.len() == 30)
            .times(10)
            .returning(|input| Ok(vec![input[input.len() - 1]]));
        let forecaster = forecaster_with(mock);

        let window = series(45);
        let points = forecaster.forecast(&window, 30, 10).unwrap();

        assert_eq!(points.len(), 10);
        let last_close = *window.closes().last().unwrap();
        for p in &points {
            assert!((p.price - last_close).abs() < 1e-9);
        }
    }

    #[test]
    fn test_multi_value_surplus_discarded() {
        let mut mock = named_mock();
        mock.expect_predict_next()
            .times(4)
            .returning(|_| Ok(vec![0.0, 0.5, 1.0]));
        let forecaster = forecaster_with(mock);

        let points = forecaster.forecast(&series(30), 30, 10).unwrap();
        assert_eq!(points.len(), 10);
    }

    #[test]
    fn test_outputs_feed_back() {
        // Each call sees the previous call's output as its last element.
        let mut mock = named_mock();
        mock.expect_predict_next()
            .times(5)
            .returning(|input| Ok(vec![input[input.len() - 1] + 0.01]));
        let forecaster = forecaster_with(mock);

        let points = forecaster.forecast(&series(30), 30, 5).unwrap();
        for pair in points.windows(2) {
            assert!(pair[1].price > pair[0].price);
        }
    }

    #[test]
    fn test_dates_follow_window() {
        let mut mock = named_mock();
        mock.expect_predict_next().returning(|_| Ok(vec![0.0]));
        let forecaster = forecaster_with(mock);

        let window = series(31);
        let last = window.last_date().unwrap();
        let points = forecaster.forecast(&window, 30, 7).unwrap();

        assert!(points[0].date > last);
        assert!(points.windows(2).all(|p| p[0].date < p[1].date));
        assert_eq!(points[0].date, date(2025, 2, 1));
    }

    #[test]
    fn test_empty_or_non_finite_output() {
        let mut mock = named_mock();
        mock.expect_predict_next().returning(|_| Ok(vec![]));
        assert!(matches!(
            forecaster_with(mock).forecast(&series(30), 30, 3),
            Err(ForecastError::InferenceFailed(_))
        ));

        let mut mock = named_mock();
        mock.expect_predict_next().returning(|_| Ok(vec![f64::NAN]));
        assert!(matches!(
            forecaster_with(mock).forecast(&series(30), 30, 3),
            Err(ForecastError::InferenceFailed(_))
        ));
    }

    #[test]
    fn test_window_beyond_model_limit() {
        let mut mock = MockSequenceModel::new();
        mock.expect_name().return_const("mock".to_string());
        mock.expect_max_input_len().return_const(Some(16usize));
        mock.expect_predict_next().times(0);

        assert!(matches!(
            forecaster_with(mock).forecast(&series(40), 30, 3),
            Err(ForecastError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_deterministic_on_one_device() {
        let forecaster = transam_forecaster(Device::Cpu);
        let window = series(60);
        let a = forecaster.forecast(&window, 30, 10).unwrap();
        let b = forecaster.forecast(&window, 30, 10).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_equal_across_devices() {
        let window = series(60);
        let cpu = transam_forecaster(Device::Cpu)
            .forecast(&window, 30, 10)
            .unwrap();
        let par = transam_forecaster(Device::Parallel { threads: 4 })
            .forecast(&window, 30, 10)
            .unwrap();
        assert_eq!(cpu.len(), 10);
        for (c, p) in cpu.iter().zip(&par) {
            assert_eq!(c.date, p.date);
            assert_eq!(c.price.to_bits(), p.price.to_bits());
        }
    }
}
