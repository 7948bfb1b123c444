//! Series window loader
//!
//! Cuts an inclusive date range out of a bar collection. The loader holds no
//! state between calls.

use crate::bar::Bar;
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use tracing::debug;

/// Ordered bars with strictly increasing timestamps
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SeriesWindow {
    bars: Vec<Bar>,
}

impl SeriesWindow {
    /// Build a window, checking that timestamps strictly increase
    pub fn new(bars: Vec<Bar>) -> Result<Self> {
        if let Some(pair) = bars
            .windows(2)
            .find(|pair| pair[0].timestamp >= pair[1].timestamp)
        {
            return Err(ForecastError::InvalidInput(format!(
                "bars must have strictly increasing timestamps ({} then {})",
                pair[0].timestamp, pair[1].timestamp
            )));
        }
        Ok(Self { bars })
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Closing prices in window order
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Date of the most recent bar
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.timestamp)
    }
}

/// Select the bars with `from <= timestamp <= to`, preserving order
pub fn load_window(bars: &[Bar], from: NaiveDate, to: NaiveDate) -> Result<SeriesWindow> {
    if from > to {
        return Err(ForecastError::InvalidRange { from, to });
    }

    let selected: Vec<Bar> = bars
        .iter()
        .filter(|bar| (from..=to).contains(&bar.timestamp))
        .copied()
        .collect();

    debug!(
        from = %from,
        to = %to,
        total = bars.len(),
        selected = selected.len(),
        "Loaded series window"
    );

    SeriesWindow::new(selected)
}
