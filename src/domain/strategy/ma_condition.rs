//! Moving-average alignment strengthening.
//!
//! Selected when MA60 is rising, MA30 crossed above MA60 within the last 5
//! bars, today's close is above MA5 and today's volume beats yesterday's.

use super::{volume_evidence, Verdict};
use crate::domain::bar::Bar;
use crate::domain::indicator::{closes, sma};

pub const MIN_BARS: usize = 60;
pub const LOOKBACK: usize = 120;

const CROSS_WINDOW: usize = 5;

pub fn evaluate(series: &[Bar]) -> Verdict {
    let n = series.len();
    if n < MIN_BARS {
        return Verdict::rejected();
    }

    let closes = closes(series);
    let ma5 = sma(&closes, 5);
    let ma30 = sma(&closes, 30);
    let ma60 = sma(&closes, 60);
    let last = n - 1;

    let (Some(ma5_now), Some(ma30_now), Some(ma60_now)) = (ma5[last], ma30[last], ma60[last])
    else {
        return Verdict::rejected();
    };

    let rising = ma60[last - 1].is_some_and(|prev| ma60_now > prev);
    if !rising {
        return Verdict::rejected();
    }

    let cross = (1..=CROSS_WINDOW.min(n - 1))
        .map(|k| n - k)
        .find(|&i| crossed_above(&ma30, &ma60, i));
    let Some(cross) = cross else {
        return Verdict::rejected();
    };

    if !series[last].close.is_some_and(|c| c > ma5_now) {
        return Verdict::rejected();
    }

    let volume_up = match (series[last].volume, series[last - 1].volume) {
        (Some(today), Some(yesterday)) => today > yesterday,
        _ => false,
    };
    if !volume_up {
        return Verdict::rejected();
    }

    let verdict = Verdict::selected(Some(series[cross].date))
        .with_metric("ma5", Some(ma5_now))
        .with_metric("ma30", Some(ma30_now))
        .with_metric("ma60", Some(ma60_now));
    volume_evidence(verdict, series)
}

/// `fast` above `slow` at `i` and not above at `i - 1`.
fn crossed_above(fast: &[Option<f64>], slow: &[Option<f64>], i: usize) -> bool {
    if i == 0 {
        return false;
    }
    match (fast[i], slow[i], fast[i - 1], slow[i - 1]) {
        (Some(f), Some(s), Some(pf), Some(ps)) => f > s && pf <= ps,
        _ => false,
    }
}
