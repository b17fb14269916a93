//! N-consecutive limit-up detection.

use super::{metric, Verdict};
use crate::domain::bar::Bar;

pub const MAIN_BOARD_LIMIT_PCT: f64 = 9.9;
/// ChiNext (30xxxx) and STAR (68xxxx) trade with a 20% band.
pub const GROWTH_BOARD_LIMIT_PCT: f64 = 19.8;

pub fn limit_up_threshold(code: &str) -> f64 {
    if code.starts_with("30") || code.starts_with("68") {
        GROWTH_BOARD_LIMIT_PCT
    } else {
        MAIN_BOARD_LIMIT_PCT
    }
}

fn is_limit_up(bar: &Bar, threshold: f64) -> bool {
    bar.pct_change.is_some_and(|p| p >= threshold)
}

/// With `days == 1` the most recent limit-up bar triggers. With more, the
/// chronologically first run of `days` consecutive limit-up bars triggers
/// and reports its last bar.
pub fn evaluate(code: &str, series: &[Bar], days: usize) -> Verdict {
    if days == 0 || series.len() < days {
        return Verdict::rejected();
    }
    let threshold = limit_up_threshold(code);

    let hit = if days == 1 {
        series.iter().rev().find(|b| is_limit_up(b, threshold))
    } else {
        series
            .windows(days)
            .find(|w| w.iter().all(|b| is_limit_up(b, threshold)))
            .and_then(|w| w.last())
    };

    match hit {
        Some(bar) => Verdict::selected(Some(bar.date))
            .with_metric(metric::PCT_CHANGE, bar.pct_change)
            .with_metric("threshold", Some(threshold)),
        None => Verdict::rejected(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::strategy::test_support::{day, series_with_pct};

    #[test]
    fn threshold_by_board() {
        assert_eq!(limit_up_threshold("300750.SZ"), 19.8);
        assert_eq!(limit_up_threshold("688981.SH"), 19.8);
        assert_eq!(limit_up_threshold("600000.SH"), 9.9);
        assert_eq!(limit_up_threshold("000001.SZ"), 9.9);
        assert_eq!(limit_up_threshold("830799"), 9.9);
    }

    #[test]
    fn single_day_reports_most_recent_hit() {
        let s = series_with_pct("600000.SH", &[Some(10.0), Some(1.0), Some(9.9), Some(-2.0)]);
        let v = evaluate("600000.SH", &s, 1);
        assert!(v.selected);
        assert_eq!(v.trigger_date, Some(day(2)));
        assert_eq!(v.metric(metric::PCT_CHANGE), Some(9.9));
    }

    #[test]
    fn single_day_no_hit() {
        let s = series_with_pct("600000.SH", &[Some(9.89), None, Some(5.0)]);
        assert!(!evaluate("600000.SH", &s, 1).selected);
    }

    #[test]
    fn growth_board_needs_twenty_percent() {
        let s = series_with_pct("300750.SZ", &[Some(10.0), Some(15.0)]);
        assert!(!evaluate("300750.SZ", &s, 1).selected);
        let s = series_with_pct("300750.SZ", &[Some(10.0), Some(19.8)]);
        assert!(evaluate("300750.SZ", &s, 1).selected);
    }

    #[test]
    fn consecutive_run_reports_last_day_of_first_run() {
        let s = series_with_pct(
            "000001.SZ",
            &[Some(1.0), Some(10.0), Some(10.0), Some(9.95), Some(10.0)],
        );
        let v = evaluate("000001.SZ", &s, 3);
        assert!(v.selected);
        assert_eq!(v.trigger_date, Some(day(3)));
        assert_eq!(v.metric(metric::PCT_CHANGE), Some(9.95));
    }

    #[test]
    fn broken_run_is_not_selected() {
        let s = series_with_pct("000001.SZ", &[Some(10.0), None, Some(10.0), Some(10.0)]);
        assert!(!evaluate("000001.SZ", &s, 3).selected);
    }

    #[test]
    fn series_shorter_than_n() {
        let s = series_with_pct("000001.SZ", &[Some(10.0), Some(10.0)]);
        assert!(!evaluate("000001.SZ", &s, 3).selected);
        assert!(!evaluate("000001.SZ", &s, 0).selected);
    }
}
