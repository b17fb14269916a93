//! Weekly MA bullish alignment transition.
//!
//! Resamples to weekly closes and selects when this week's MA5 >= MA10 >=
//! MA20 >= MA30 holds but did not hold the week before.

use super::{volume_evidence, Verdict};
use crate::domain::bar::Bar;
use crate::domain::indicator::{resample_weekly, sma};

pub const MIN_BARS: usize = 300;
pub const LOOKBACK: usize = 300;

/// `[ma5, ma10, ma20, ma30]`; an undefined average never aligns.
pub fn is_bullish_alignment(ma: [Option<f64>; 4]) -> bool {
    match ma {
        [Some(a), Some(b), Some(c), Some(d)] => a >= b && b >= c && c >= d,
        _ => false,
    }
}

pub fn evaluate(series: &[Bar]) -> Verdict {
    if series.len() < MIN_BARS {
        return Verdict::rejected();
    }

    let weeks = resample_weekly(series);
    if weeks.len() < 2 {
        return Verdict::rejected();
    }
    let closes: Vec<Option<f64>> = weeks.iter().map(|w| w.close).collect();
    let mas = [
        sma(&closes, 5),
        sma(&closes, 10),
        sma(&closes, 20),
        sma(&closes, 30),
    ];
    let at = |i: usize| [mas[0][i], mas[1][i], mas[2][i], mas[3][i]];

    let current = weeks.len() - 1;
    let now = at(current);
    if !is_bullish_alignment(now) || is_bullish_alignment(at(current - 1)) {
        return Verdict::rejected();
    }

    let verdict = Verdict::selected(Some(weeks[current].week_start))
        .with_metric("weekly_ma5", now[0])
        .with_metric("weekly_ma10", now[1])
        .with_metric("weekly_ma20", now[2])
        .with_metric("weekly_ma30", now[3]);
    volume_evidence(verdict, series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::strategy::test_support::{day, series};

    /// Five bars per week, every bar in a week closing at that week's value.
    fn daily_from_weekly(weekly: &[f64]) -> Vec<Bar> {
        let closes: Vec<Option<f64>> = weekly
            .iter()
            .flat_map(|&c| std::iter::repeat(Some(c)).take(5))
            .collect();
        series("600000.SH", &closes, &[], &[])
    }

    #[test]
    fn transition_into_alignment_is_selected() {
        let mut weekly = vec![100.0; 60];
        weekly.push(90.0);
        weekly.push(200.0);
        let s = daily_from_weekly(&weekly);
        assert_eq!(s.len(), 310);
        let v = evaluate(&s);
        assert!(v.selected);
        assert_eq!(v.trigger_date, Some(day(305)));
        assert_eq!(v.metric("weekly_ma5"), Some(118.0));
        assert_eq!(v.metric("weekly_ma30"), Some(103.0));
    }

    #[test]
    fn steady_state_alignment_is_not_selected() {
        let s = daily_from_weekly(&vec![100.0; 62]);
        assert!(!evaluate(&s).selected);

        let rising: Vec<f64> = (0..62).map(|i| 100.0 + i as f64).collect();
        assert!(!evaluate(&daily_from_weekly(&rising)).selected);
    }

    #[test]
    fn not_aligned_this_week() {
        let mut weekly = vec![100.0; 61];
        weekly.push(90.0);
        assert!(!evaluate(&daily_from_weekly(&weekly)).selected);
    }

    #[test]
    fn fewer_than_300_bars() {
        let mut weekly = vec![100.0; 58];
        weekly.push(90.0);
        weekly.push(200.0);
        let s = daily_from_weekly(&weekly);
        assert_eq!(s.len(), 300);
        assert!(evaluate(&s).selected);
        assert!(!evaluate(&s[1..]).selected);
    }

    #[test]
    fn alignment_predicate() {
        assert!(is_bullish_alignment([Some(4.0), Some(3.0), Some(2.0), Some(1.0)]));
        assert!(is_bullish_alignment([Some(1.0); 4]));
        assert!(!is_bullish_alignment([Some(4.0), Some(3.0), Some(5.0), Some(1.0)]));
        assert!(!is_bullish_alignment([Some(4.0), Some(3.0), Some(2.0), None]));
    }
}
