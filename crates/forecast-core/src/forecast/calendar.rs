//! Forecast date stepping

use crate::error::{ForecastError, Result};
use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How forecast dates advance past the last observed bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateStep {
    /// Consecutive calendar days
    #[default]
    Calendar,
    /// Weekdays only
    Business,
}

impl DateStep {
    /// The date following `date`
    pub fn next(self, date: NaiveDate) -> Result<NaiveDate> {
        let mut next = step_day(date)?;
        if self == Self::Business {
            while matches!(next.weekday(), Weekday::Sat | Weekday::Sun) {
                next = step_day(next)?;
            }
        }
        Ok(next)
    }

    /// `count` dates strictly after `last`, in increasing order
    pub fn dates_after(self, last: NaiveDate, count: usize) -> Result<Vec<NaiveDate>> {
        let mut dates = Vec::new();
        let mut current = last;
        for _ in 0..count {
            current = self.next(current)?;
            dates.push(current);
        }
        Ok(dates)
    }
}

fn step_day(date: NaiveDate) -> Result<NaiveDate> {
    date.checked_add_days(Days::new(1))
        .ok_or_else(|| ForecastError::InvalidInput(format!("date {date} out of range")))
}

impl FromStr for DateStep {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "calendar" => Ok(Self::Calendar),
            "business" => Ok(Self::Business),
            other => Err(ForecastError::InvalidInput(format!(
                "unknown date step '{other}' (expected calendar or business)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_calendar_steps() {
        let dates = DateStep::Calendar
            .dates_after(date(2025, 2, 27), 3)
            .unwrap();
        assert_eq!(dates, vec![date(2025, 2, 28), date(2025, 3, 1), date(2025, 3, 2)]);
    }

    #[test]
    fn test_business_skips_weekend() {
        // 2025-01-03 is a Friday
        let dates = DateStep::Business
            .dates_after(date(2025, 1, 3), 3)
            .unwrap();
        assert_eq!(dates, vec![date(2025, 1, 6), date(2025, 1, 7), date(2025, 1, 8)]);

        // starting on a Saturday
        assert_eq!(DateStep::Business.next(date(2025, 1, 4)).unwrap(), date(2025, 1, 6));
    }

    #[test]
    fn test_parse() {
        assert_eq!("Business".parse::<DateStep>().unwrap(), DateStep::Business);
        assert_eq!("calendar".parse::<DateStep>().unwrap(), DateStep::Calendar);
        assert!("weekly".parse::<DateStep>().is_err());
    }

    #[test]
    fn test_out_of_range() {
        assert!(DateStep::Calendar.next(NaiveDate::MAX).is_err());
    }
}
