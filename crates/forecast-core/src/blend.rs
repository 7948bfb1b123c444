//! Sentiment-weighted forecast adjustment
//!
//! For the point at horizon index `i` (0-based) and a rating of `stars`:
//!
//! ```text
//! s      = (stars - 3) / 2
//! factor = 1 + strength * tanh(2s) * exp(-decay_rate * i)
//! ```
//!
//! A neutral rating returns the forecast unchanged.

use crate::error::{ForecastError, Result};
use crate::forecast::ForecastPoint;
use crate::sentiment::SentimentResult;
use serde::{Deserialize, Serialize};

/// Blend parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlendPolicy {
    /// Largest relative adjustment, reached at 1 or 5 stars on day 0
    pub strength: f64,
    /// Per-step exponential decay of the adjustment
    pub decay_rate: f64,
}

impl Default for BlendPolicy {
    fn default() -> Self {
        Self {
            strength: 0.15,
            decay_rate: 0.12,
        }
    }
}

impl BlendPolicy {
    pub fn new(strength: f64, decay_rate: f64) -> Result<Self> {
        let policy = Self {
            strength,
            decay_rate,
        };
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.strength) {
            return Err(ForecastError::InvalidInput(format!(
                "blend strength {} outside [0, 1)",
                self.strength
            )));
        }
        if !self.decay_rate.is_finite() || self.decay_rate < 0.0 {
            return Err(ForecastError::InvalidInput(format!(
                "blend decay rate {} must be a non-negative number",
                self.decay_rate
            )));
        }
        Ok(())
    }

    /// Multiplier for a rating at horizon index `index`
    pub fn factor(&self, stars: u8, index: usize) -> f64 {
        let s = (f64::from(stars) - 3.0) / 2.0;
        let base = self.strength * (2.0 * s).tanh();
        let decay = (-self.decay_rate * index as f64).exp();
        1.0 + base * decay
    }

    /// Adjust each point of `forecast` by the sentiment factor
    ///
    /// Dates are kept; a neutral rating yields an exact copy.
    pub fn apply(&self, forecast: &[ForecastPoint], sentiment: SentimentResult) -> Vec<ForecastPoint> {
        if sentiment.is_neutral() {
            return forecast.to_vec();
        }
        forecast
            .iter()
            .enumerate()
            .map(|(i, point)| ForecastPoint {
                date: point.date,
                price: point.price * self.factor(sentiment.stars(), i),
            })
            .collect()
    }
}

/// Adjust `forecast` with the default policy
pub fn blend(forecast: &[ForecastPoint], sentiment: SentimentResult) -> Vec<ForecastPoint> {
    BlendPolicy::default().apply(forecast, sentiment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn forecast(prices: &[f64]) -> Vec<ForecastPoint> {
        let start = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, p)| ForecastPoint {
                date: start + chrono::Days::new(i as u64),
                price: *p,
            })
            .collect()
    }

    #[test]
    fn test_neutral_is_exact_identity() {
        let original = forecast(&[101.123_456_789, 0.1 + 0.2, 1e-300, 98_765.4321]);
        let adjusted = blend(&original, SentimentResult::new(3));
        assert_eq!(adjusted.len(), original.len());
        for (a, o) in adjusted.iter().zip(&original) {
            assert_eq!(a.date, o.date);
            assert_eq!(a.price.to_bits(), o.price.to_bits());
        }
    }

    #[test]
    fn test_neutral_factor_is_one() {
        let policy = BlendPolicy::default();
        for i in 0..30 {
            assert_eq!(policy.factor(3, i), 1.0);
        }
    }

    #[test]
    fn test_direction() {
        let original = forecast(&[100.0; 10]);
        let up = blend(&original, SentimentResult::new(4));
        let down = blend(&original, SentimentResult::new(2));
        for ((u, d), o) in up.iter().zip(&down).zip(&original) {
            assert!(u.price > o.price);
            assert!(d.price < o.price);
        }
    }

    #[test]
    fn test_monotonic_in_stars() {
        let policy = BlendPolicy::default();
        for i in 0..20 {
            for stars in 1..5u8 {
                assert!(
                    policy.factor(stars, i) < policy.factor(stars + 1, i),
                    "stars {stars} at index {i}"
                );
            }
        }
    }

    #[test]
    fn test_decays_over_horizon() {
        let policy = BlendPolicy::default();
        assert!((policy.factor(5, 0) - (1.0 + 0.15 * 2f64.tanh())).abs() < 1e-12);
        for i in 0..10 {
            assert!(policy.factor(5, i) > policy.factor(5, i + 1));
            assert!(policy.factor(1, i) < policy.factor(1, i + 1));
        }
    }

    #[test]
    fn test_empty_forecast() {
        assert!(blend(&[], SentimentResult::new(5)).is_empty());
    }

    #[test]
    fn test_policy_validation() {
        assert!(BlendPolicy::new(0.15, 0.12).is_ok());
        assert!(BlendPolicy::new(0.0, 0.0).is_ok());
        assert!(BlendPolicy::new(1.0, 0.1).is_err());
        assert!(BlendPolicy::new(-0.1, 0.1).is_err());
        assert!(BlendPolicy::new(0.1, -0.5).is_err());
        assert!(BlendPolicy::new(f64::NAN, 0.1).is_err());
    }
}
