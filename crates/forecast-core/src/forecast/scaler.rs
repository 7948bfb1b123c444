//! Min-max scaling to `[-1, 1]`

use crate::error::{ForecastError, Result};

/// Min-max scaler fitted on one series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinMaxScaler {
    min: f64,
    max: f64,
}

impl MinMaxScaler {
    /// Fit on `values`, which must be non-empty and finite
    pub fn fit(values: &[f64]) -> Result<Self> {
        if values.is_empty() {
            return Err(ForecastError::InvalidInput(
                "cannot fit scaler on an empty series".to_string(),
            ));
        }
        if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
            return Err(ForecastError::InvalidInput(format!(
                "series contains non-finite value {bad}"
            )));
        }
        let (min, max) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        Ok(Self { min, max })
    }

    fn range(&self) -> f64 {
        self.max - self.min
    }

    /// Map a value into the scaled space; a flat series maps to 0
    pub fn transform(&self, value: f64) -> f64 {
        let range = self.range();
        if range == 0.0 {
            0.0
        } else {
            2.0 * (value - self.min) / range - 1.0
        }
    }

    /// Map a scaled value back; a flat series inverts to its constant
    pub fn inverse(&self, scaled: f64) -> f64 {
        let range = self.range();
        if range == 0.0 {
            self.min
        } else {
            (scaled + 1.0) / 2.0 * range + self.min
        }
    }

    pub fn transform_all(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|v| self.transform(*v)).collect()
    }
}
