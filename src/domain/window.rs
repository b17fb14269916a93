//! Per-instrument window building.
//!
//! Merges an instrument's historical bars with today's snapshot bar into a
//! date-unique, ascending [`InstrumentSeries`] sized for the active strategy.

use crate::domain::bar::Bar;
use crate::domain::indicator::weekly::week_start;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fmt;

/// How much history a strategy looks at, not counting today's bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookback {
    /// The most recent N bars strictly before today.
    Bars(usize),
    /// Monday of the current week through yesterday.
    CurrentWeek,
}

impl fmt::Display for Lookback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lookback::Bars(n) => write!(f, "{} bars", n),
            Lookback::CurrentWeek => write!(f, "current week"),
        }
    }
}

/// Ascending, date-unique bars for one instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentSeries {
    pub code: String,
    pub bars: Vec<Bar>,
}

impl InstrumentSeries {
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn latest(&self) -> Option<&Bar> {
        self.bars.last()
    }
}

/// Builds the evaluation window for one instrument.
///
/// Returns `None` when there is no snapshot bar: without today's quote no
/// same-day verdict is possible. A window shorter than the strategy needs
/// is still returned; the evaluator rejects it.
pub fn build_window(
    code: &str,
    history: &[Bar],
    snapshot: Option<&Bar>,
    lookback: Lookback,
    today: NaiveDate,
) -> Option<InstrumentSeries> {
    let snapshot = snapshot?;

    let mut past: Vec<&Bar> = history.iter().filter(|b| b.date < today).collect();
    past.sort_by_key(|b| b.date);

    let selected: Vec<Bar> = match lookback {
        Lookback::Bars(n) => {
            // Deduplicate before counting so repeated dates don't eat the window.
            let unique = dedup_by_date(past.into_iter().cloned().collect());
            let skip = unique.len().saturating_sub(n);
            unique.into_iter().skip(skip).collect()
        }
        Lookback::CurrentWeek => {
            let monday = week_start(today);
            past.into_iter()
                .filter(|b| b.date >= monday)
                .cloned()
                .collect()
        }
    };

    let mut today_bar = snapshot.clone();
    today_bar.date = today;

    // A stored bar for today competes with the live one in the dedup below.
    let mut merged = selected;
    merged.extend(history.iter().filter(|b| b.date == today).cloned());
    merged.push(today_bar);

    Some(InstrumentSeries {
        code: code.to_string(),
        bars: dedup_by_date(merged),
    })
}

/// Collapses bars sharing a date and sorts ascending.
///
/// On a collision the later bar wins, unless it has no volume while the
/// earlier one does: a live quote must not erase known volume.
pub fn dedup_by_date(bars: Vec<Bar>) -> Vec<Bar> {
    let mut by_date: BTreeMap<NaiveDate, Bar> = BTreeMap::new();
    for bar in bars {
        match by_date.get(&bar.date) {
            Some(existing) if bar.volume.is_none() && existing.volume.is_some() => {}
            _ => {
                by_date.insert(bar.date, bar);
            }
        }
    }
    by_date.into_values().collect()
}
