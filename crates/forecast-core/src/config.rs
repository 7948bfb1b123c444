//! Configuration for the forecast pipeline

use crate::blend::BlendPolicy;
use crate::error::{ForecastError, Result};
use crate::forecast::{DateStep, DevicePreference};
use crate::sentiment::MAX_TEXT_CHARS;
use forecast_utils::EnvLookup;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Largest horizon accepted unless configured otherwise
pub const MAX_HORIZON: usize = 365;

fn default_max_horizon() -> usize {
    MAX_HORIZON
}

/// Pipeline parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Number of trailing closes fed to the model per step
    pub input_window: usize,

    /// Default forecast horizon
    pub future_steps: usize,

    /// Upper bound on any requested horizon
    #[serde(default = "default_max_horizon")]
    pub max_horizon: usize,

    /// Model weights document
    pub weights_path: PathBuf,

    /// How forecast dates advance
    pub date_step: DateStep,

    /// Requested compute device
    pub device: DevicePreference,

    /// Sentiment adjustment parameters
    pub blend: BlendPolicy,

    /// Classifier input limit in characters
    pub max_text_chars: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_window: 30,
            future_steps: 10,
            max_horizon: MAX_HORIZON,
            weights_path: PathBuf::from("model_state.json"),
            date_step: DateStep::Calendar,
            device: DevicePreference::Auto,
            blend: BlendPolicy::default(),
            max_text_chars: MAX_TEXT_CHARS,
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration builder
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.input_window == 0 {
            return Err(ForecastError::InvalidInput(
                "input_window must be greater than 0".to_string(),
            ));
        }
        if self.future_steps == 0 {
            return Err(ForecastError::InvalidInput(
                "future_steps must be greater than 0".to_string(),
            ));
        }
        if self.future_steps > self.max_horizon {
            return Err(ForecastError::InvalidInput(format!(
                "future_steps {} exceeds max_horizon {}",
                self.future_steps, self.max_horizon
            )));
        }
        if self.max_text_chars == 0 {
            return Err(ForecastError::InvalidInput(
                "max_text_chars must be greater than 0".to_string(),
            ));
        }
        self.blend.validate()
    }
}

/// Builder for [`PipelineConfig`]
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    input_window: Option<usize>,
    future_steps: Option<usize>,
    max_horizon: Option<usize>,
    weights_path: Option<PathBuf>,
    date_step: Option<DateStep>,
    device: Option<DevicePreference>,
    blend: Option<BlendPolicy>,
    max_text_chars: Option<usize>,
}

impl PipelineConfigBuilder {
    pub fn input_window(mut self, input_window: usize) -> Self {
        self.input_window = Some(input_window);
        self
    }

    pub fn future_steps(mut self, future_steps: usize) -> Self {
        self.future_steps = Some(future_steps);
        self
    }

    pub fn max_horizon(mut self, max_horizon: usize) -> Self {
        self.max_horizon = Some(max_horizon);
        self
    }

    pub fn weights_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.weights_path = Some(path.into());
        self
    }

    pub fn date_step(mut self, date_step: DateStep) -> Self {
        self.date_step = Some(date_step);
        self
    }

    pub fn device(mut self, device: DevicePreference) -> Self {
        self.device = Some(device);
        self
    }

    pub fn blend(mut self, blend: BlendPolicy) -> Self {
        self.blend = Some(blend);
        self
    }

    pub fn max_text_chars(mut self, max_text_chars: usize) -> Self {
        self.max_text_chars = Some(max_text_chars);
        self
    }

    /// Fill unset fields from `FORECAST_*` variables
    ///
    /// Reads `FORECAST_INPUT_WINDOW`, `FORECAST_FUTURE_STEPS`,
    /// `FORECAST_MAX_HORIZON`, `FORECAST_WEIGHTS`, `FORECAST_DATE_STEP`
    /// and `FORECAST_DEVICE`.
    /// Values set on the builder win.
    pub fn with_env(mut self, env: &impl EnvLookup) -> Result<Self> {
        if self.input_window.is_none() {
            self.input_window = env.parsed("FORECAST_INPUT_WINDOW")?;
        }
        if self.future_steps.is_none() {
            self.future_steps = env.parsed("FORECAST_FUTURE_STEPS")?;
        }
        if self.max_horizon.is_none() {
            self.max_horizon = env.parsed("FORECAST_MAX_HORIZON")?;
        }
        if self.weights_path.is_none() {
            self.weights_path = env.optional("FORECAST_WEIGHTS").map(PathBuf::from);
        }
        if self.date_step.is_none() {
            self.date_step = env
                .optional("FORECAST_DATE_STEP")
                .map(|raw| raw.parse())
                .transpose()?;
        }
        if self.device.is_none() {
            self.device = env
                .optional("FORECAST_DEVICE")
                .map(|raw| raw.parse())
                .transpose()?;
        }
        Ok(self)
    }

    /// Build the configuration
    pub fn build(self) -> Result<PipelineConfig> {
        let defaults = PipelineConfig::default();

        let config = PipelineConfig {
            input_window: self.input_window.unwrap_or(defaults.input_window),
            future_steps: self.future_steps.unwrap_or(defaults.future_steps),
            max_horizon: self.max_horizon.unwrap_or(defaults.max_horizon),
            weights_path: self.weights_path.unwrap_or(defaults.weights_path),
            date_step: self.date_step.unwrap_or(defaults.date_step),
            device: self.device.unwrap_or(defaults.device),
            blend: self.blend.unwrap_or(defaults.blend),
            max_text_chars: self.max_text_chars.unwrap_or(defaults.max_text_chars),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.input_window, 30);
        assert_eq!(config.future_steps, 10);
        assert_eq!(config.max_horizon, 365);
        assert_eq!(config.max_text_chars, 500);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = PipelineConfig::builder()
            .input_window(60)
            .future_steps(5)
            .date_step(DateStep::Business)
            .device(DevicePreference::Cpu)
            .build()
            .unwrap();

        assert_eq!(config.input_window, 60);
        assert_eq!(config.future_steps, 5);
        assert_eq!(config.date_step, DateStep::Business);
        assert_eq!(config.device, DevicePreference::Cpu);
    }

    #[test]
    fn test_validation() {
        assert!(PipelineConfig::builder().input_window(0).build().is_err());
        assert!(PipelineConfig::builder().future_steps(0).build().is_err());
        assert!(PipelineConfig::builder().max_horizon(0).build().is_err());
        assert!(
            PipelineConfig::builder()
                .future_steps(30)
                .max_horizon(20)
                .build()
                .is_err()
        );
        assert!(
            PipelineConfig::builder()
                .blend(BlendPolicy {
                    strength: 2.0,
                    decay_rate: 0.1
                })
                .build()
                .is_err()
        );
    }

    #[test]
    fn test_env_overrides() {
        let vars = env(&[
            ("FORECAST_INPUT_WINDOW", "45"),
            ("FORECAST_MAX_HORIZON", "90"),
            ("FORECAST_WEIGHTS", "/models/amzn.json"),
            ("FORECAST_DATE_STEP", "business"),
            ("FORECAST_DEVICE", "cpu"),
        ]);
        let config = PipelineConfig::builder()
            .future_steps(3)
            .with_env(&vars)
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(config.input_window, 45);
        assert_eq!(config.future_steps, 3);
        assert_eq!(config.max_horizon, 90);
        assert_eq!(config.weights_path, PathBuf::from("/models/amzn.json"));
        assert_eq!(config.date_step, DateStep::Business);
        assert_eq!(config.device, DevicePreference::Cpu);
    }

    #[test]
    fn test_builder_wins_over_env() {
        let vars = env(&[("FORECAST_INPUT_WINDOW", "45")]);
        let config = PipelineConfig::builder()
            .input_window(20)
            .with_env(&vars)
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(config.input_window, 20);
    }

    #[test]
    fn test_env_parse_errors() {
        let vars = env(&[("FORECAST_INPUT_WINDOW", "thirty")]);
        assert!(matches!(
            PipelineConfig::builder().with_env(&vars),
            Err(ForecastError::InvalidInput(_))
        ));

        let vars = env(&[("FORECAST_DEVICE", "tpu")]);
        assert!(PipelineConfig::builder().with_env(&vars).is_err());
    }
}
