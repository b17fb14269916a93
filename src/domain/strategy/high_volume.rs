//! High-volume spike followed by a shrinking-volume decline.
//!
//! Over the last 10 bars, all of:
//! - some bar traded at least 4x its trailing 20-bar average volume;
//! - no more than 2 bars closed limit-up;
//! - at least 4 consecutive bars each had lower volume and a lower close
//!   than the bar before.

use super::{volume_evidence, Verdict};
use crate::domain::bar::Bar;
use crate::domain::indicator::{sma, volumes};
use crate::domain::strategy::limit_up::MAIN_BOARD_LIMIT_PCT;

pub const MIN_BARS: usize = 30;
pub const LOOKBACK: usize = 60;

const RECENT_BARS: usize = 10;
const VOLUME_MA_PERIOD: usize = 20;
const SPIKE_MULTIPLE: f64 = 4.0;
const MAX_LIMIT_UPS: usize = 2;
const MIN_DECLINE_RUN: usize = 4;

pub fn evaluate(series: &[Bar]) -> Verdict {
    let n = series.len();
    if n < MIN_BARS {
        return Verdict::rejected();
    }

    let volumes = volumes(series);
    let volume_ma = sma(&volumes, VOLUME_MA_PERIOD);
    let recent = (n - RECENT_BARS)..n;

    if recent.clone().any(|i| volume_ma[i].is_none()) {
        return Verdict::rejected();
    }

    let spike = recent.clone().rev().find(|&i| match (volumes[i], volume_ma[i]) {
        (Some(v), Some(ma)) => v >= SPIKE_MULTIPLE * ma,
        _ => false,
    });
    let Some(spike) = spike else {
        return Verdict::rejected();
    };

    let limit_ups = recent
        .clone()
        .filter(|&i| series[i].pct_change.is_some_and(|p| p >= MAIN_BOARD_LIMIT_PCT))
        .count();
    if limit_ups > MAX_LIMIT_UPS {
        return Verdict::rejected();
    }

    if longest_shrinking_decline(&series[recent]) < MIN_DECLINE_RUN {
        return Verdict::rejected();
    }

    let verdict = Verdict::selected(Some(series[spike].date))
        .with_metric("spike_volume", volumes[spike])
        .with_metric("volume_ma20", volume_ma[spike]);
    volume_evidence(verdict, series)
}

/// Longest run of bars whose volume and close are both below the previous
/// bar's. The first bar of `bars` has no predecessor and never counts.
fn longest_shrinking_decline(bars: &[Bar]) -> usize {
    let mut longest = 0;
    let mut run = 0;
    for pair in bars.windows(2) {
        let (prev, cur) = (&pair[0], &pair[1]);
        let shrinking = matches!((cur.volume, prev.volume), (Some(c), Some(p)) if c < p);
        let declining = matches!((cur.close, prev.close), (Some(c), Some(p)) if c < p);
        if shrinking && declining {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    longest
}
