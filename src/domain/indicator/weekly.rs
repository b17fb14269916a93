//! Daily-to-weekly resampling.
//!
//! Weeks run Monday through Sunday. A week's close is the last non-null
//! daily close inside it.

use crate::domain::bar::Bar;
use chrono::{Datelike, Days, NaiveDate};

#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyBar {
    /// Monday of the week.
    pub week_start: NaiveDate,
    pub close: Option<f64>,
}

/// Expects `bars` ascending by date.
pub fn resample_weekly(bars: &[Bar]) -> Vec<WeeklyBar> {
    let mut weeks: Vec<WeeklyBar> = Vec::new();
    for bar in bars {
        let start = week_start(bar.date);
        match weeks.last_mut() {
            Some(w) if w.week_start == start => {
                if bar.close.is_some() {
                    w.close = bar.close;
                }
            }
            _ => weeks.push(WeeklyBar {
                week_start: start,
                close: bar.close,
            }),
        }
    }
    weeks
}

pub fn week_start(date: NaiveDate) -> NaiveDate {
    let offset = date.weekday().num_days_from_monday() as u64;
    date.checked_sub_days(Days::new(offset)).unwrap_or(date)
}
