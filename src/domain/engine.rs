//! Selection engine: one pass over every instrument in the history.

use crate::domain::aligner::{align_fields, field_presence};
use crate::domain::bar::Bar;
use crate::domain::cancel::CancellationToken;
use crate::domain::error::ScreenerError;
use crate::domain::schema::Field;
use crate::domain::strategy::{metric, Strategy};
use crate::domain::table::Table;
use crate::domain::window::{build_window, Lookback};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

/// Instruments between progress log lines.
pub const PROGRESS_EVERY: usize = 500;

/// One matched instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionRow {
    pub code: String,
    pub name: String,
    pub trigger_date: Option<NaiveDate>,
    pub latest_price: Option<f64>,
    pub pct_change: Option<f64>,
    /// Evaluator evidence beyond price and percent change.
    pub metrics: BTreeMap<String, Option<f64>>,
}

struct SnapshotEntry {
    bar: Bar,
    name: Option<String>,
}

pub struct SelectionEngine<'a> {
    strategy: &'a Strategy,
    lookback: Lookback,
    today: NaiveDate,
    names: &'a HashMap<String, String>,
}

impl<'a> SelectionEngine<'a> {
    pub fn new(
        strategy: &'a Strategy,
        lookback: Lookback,
        today: NaiveDate,
        names: &'a HashMap<String, String>,
    ) -> Self {
        Self {
            strategy,
            lookback,
            today,
            names,
        }
    }

    /// Screens every instrument of `history` against today's `snapshot`.
    ///
    /// Rows come back sorted by code. A failure on one instrument is logged
    /// and skipped; only cancellation aborts the pass.
    pub fn run(
        &self,
        history: &Table,
        snapshot: &Table,
        cancel: &CancellationToken,
    ) -> Result<Vec<SelectionRow>, ScreenerError> {
        for (column, in_history, in_snapshot) in field_presence(history, snapshot) {
            debug!(%column, history = in_history, snapshot = in_snapshot, "field presence");
        }
        let (history, snapshot) = align_fields(history, snapshot);

        let snapshot = self.index_snapshot(&snapshot);
        let groups = group_by_code(&history);
        let total = groups.len();
        info!(
            strategy = self.strategy.name(),
            lookback = %self.lookback,
            today = %self.today,
            instruments = total,
            "starting selection"
        );

        let mut rows = Vec::new();
        for (i, (code, indices)) in groups.iter().enumerate() {
            cancel.check()?;
            if i > 0 && i % PROGRESS_EVERY == 0 {
                info!(processed = i, total, matched = rows.len(), "selection progress");
            }
            match self.screen_instrument(code, &history, indices, snapshot.get(code.as_str())) {
                Ok(Some(row)) => rows.push(row),
                Ok(None) => {}
                Err(e) => warn!(code = %code, error = %e, "evaluation failed, instrument skipped"),
            }
        }

        rows.sort_by(|a, b| a.code.cmp(&b.code));
        info!(matched = rows.len(), total, "selection complete");
        Ok(rows)
    }

    fn index_snapshot(&self, snapshot: &Table) -> HashMap<String, SnapshotEntry> {
        let mut index = HashMap::with_capacity(snapshot.len());
        for row in 0..snapshot.len() {
            match Bar::from_row(snapshot, row, Some(self.today)) {
                Ok(bar) => {
                    let name = snapshot.cell(row, Field::Name.column()).map(str::to_string);
                    index.insert(bar.code.clone(), SnapshotEntry { bar, name });
                }
                Err(e) => warn!(row, error = %e, "unusable snapshot row"),
            }
        }
        index
    }

    fn screen_instrument(
        &self,
        code: &str,
        history: &Table,
        indices: &[usize],
        snapshot: Option<&SnapshotEntry>,
    ) -> Result<Option<SelectionRow>, ScreenerError> {
        let Some(entry) = snapshot else {
            return Ok(None);
        };
        let bars = indices
            .iter()
            .map(|&i| Bar::from_row(history, i, None))
            .collect::<Result<Vec<_>, _>>()?;
        let Some(window) = build_window(code, &bars, Some(&entry.bar), self.lookback, self.today)
        else {
            return Ok(None);
        };

        let mut verdict = self.strategy.evaluate(code, &window.bars);
        if !verdict.selected {
            return Ok(None);
        }

        let latest = window.latest();
        let pct_change = verdict
            .metrics
            .remove(metric::PCT_CHANGE)
            .flatten()
            .or_else(|| latest.and_then(|b| b.pct_change));
        let name = self
            .names
            .get(code)
            .cloned()
            .or_else(|| entry.name.clone())
            .unwrap_or_default();

        Ok(Some(SelectionRow {
            code: code.to_string(),
            name,
            trigger_date: verdict.trigger_date,
            latest_price: latest.and_then(|b| b.close),
            pct_change,
            metrics: verdict.metrics,
        }))
    }
}

/// Row indices of each instrument, keyed by code.
fn group_by_code(table: &Table) -> BTreeMap<String, Vec<usize>> {
    let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for row in 0..table.len() {
        if let Some(code) = table.cell(row, Field::Code.column()) {
            groups.entry(code.to_string()).or_default().push(row);
        }
    }
    groups
}
