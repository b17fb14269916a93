//! Latest close above a price floor.

use super::{metric, Verdict};
use crate::domain::bar::Bar;

pub const DEFAULT_MIN_CLOSE: f64 = 100.0;
pub const LOOKBACK: usize = 5;

/// Strictly greater than `min_close`; a missing close is not selected.
pub fn evaluate(series: &[Bar], min_close: f64) -> Verdict {
    let Some(latest) = series.last() else {
        return Verdict::rejected();
    };
    match latest.close {
        Some(close) if close > min_close => Verdict::selected(Some(latest.date))
            .with_metric(metric::CLOSE, Some(close))
            .with_metric(metric::PCT_CHANGE, latest.pct_change),
        _ => Verdict::rejected(),
    }
}
