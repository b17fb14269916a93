//! MA5/MA10 golden cross on the latest bar.

use super::{metric, Verdict};
use crate::domain::bar::Bar;
use crate::domain::indicator::{closes, sma};

pub const LOOKBACK: usize = 20;

/// `(ma5, ma10)` on the prior bar and the latest bar.
pub fn golden_cross(prev: (Option<f64>, Option<f64>), last: (Option<f64>, Option<f64>)) -> bool {
    match (prev, last) {
        ((Some(p5), Some(p10)), (Some(l5), Some(l10))) => p5 < p10 && l5 > l10,
        _ => false,
    }
}

pub fn evaluate(series: &[Bar]) -> Verdict {
    let n = series.len();
    if n < 2 {
        return Verdict::rejected();
    }
    let closes = closes(series);
    let ma5 = sma(&closes, 5);
    let ma10 = sma(&closes, 10);

    if !golden_cross((ma5[n - 2], ma10[n - 2]), (ma5[n - 1], ma10[n - 1])) {
        return Verdict::rejected();
    }
    let latest = &series[n - 1];
    Verdict::selected(Some(latest.date))
        .with_metric("ma5", ma5[n - 1])
        .with_metric("ma10", ma10[n - 1])
        .with_metric(metric::PCT_CHANGE, latest.pct_change)
}
