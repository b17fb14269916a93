#![allow(dead_code)]

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, Weekday};
use dailyscreen::domain::error::ScreenerError;
use dailyscreen::domain::snapshot::{RetryPolicy, SnapshotSettings};
use dailyscreen::domain::table::Table;
use dailyscreen::ports::history_port::HistoryPort;
use dailyscreen::ports::instrument_port::InstrumentPort;
use dailyscreen::ports::quote_port::{CachedSnapshot, QuoteFeedPort, SnapshotCachePort};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::time::Duration;

pub struct MockHistoryPort {
    pub table: Table,
    pub error: Option<String>,
}

impl MockHistoryPort {
    pub fn new(table: Table) -> Self {
        Self { table, error: None }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            table: Table::default(),
            error: Some(reason.to_string()),
        }
    }
}

impl HistoryPort for MockHistoryPort {
    fn source(&self) -> String {
        "mock-history".to_string()
    }

    fn load_raw(&self) -> Result<Table, ScreenerError> {
        match &self.error {
            Some(reason) => Err(ScreenerError::DatasetUnavailable {
                path: self.source(),
                reason: reason.clone(),
            }),
            None => Ok(self.table.clone()),
        }
    }
}

/// Fails the first `failures` calls, serves a table with unrecognised
/// headers for the next `malformed`, then serves `table`.
pub struct MockQuoteFeed {
    pub table: Table,
    pub failures: u32,
    pub malformed: u32,
    pub calls: Cell<u32>,
}

impl MockQuoteFeed {
    pub fn new(table: Table) -> Self {
        Self {
            table,
            failures: 0,
            malformed: 0,
            calls: Cell::new(0),
        }
    }

    pub fn failing_first(mut self, failures: u32) -> Self {
        self.failures = failures;
        self
    }

    pub fn malformed_first(mut self, malformed: u32) -> Self {
        self.malformed = malformed;
        self
    }
}

impl QuoteFeedPort for MockQuoteFeed {
    fn fetch_quotes(&self) -> Result<Table, ScreenerError> {
        self.calls.set(self.calls.get() + 1);
        if self.calls.get() <= self.failures {
            return Err(ScreenerError::Feed {
                reason: "connection reset".to_string(),
            });
        }
        if self.calls.get() <= self.failures.saturating_add(self.malformed) {
            let mut junk = Table::new(vec!["代码".into(), "名".into()]);
            junk.push_row(vec![Some("600000".into()), Some("x".into())]);
            return Ok(junk);
        }
        Ok(self.table.clone())
    }
}

#[derive(Default)]
pub struct MockCache {
    pub entry: RefCell<Option<CachedSnapshot>>,
    pub stores: Cell<u32>,
}

impl MockCache {
    pub fn with_entry(entry: CachedSnapshot) -> Self {
        Self {
            entry: RefCell::new(Some(entry)),
            stores: Cell::new(0),
        }
    }
}

impl SnapshotCachePort for MockCache {
    fn load(&self) -> Result<Option<CachedSnapshot>, ScreenerError> {
        Ok(self.entry.borrow().clone())
    }

    fn store(&self, snapshot: &CachedSnapshot) -> Result<(), ScreenerError> {
        self.stores.set(self.stores.get() + 1);
        *self.entry.borrow_mut() = Some(snapshot.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct MockInstruments {
    pub names: HashMap<String, String>,
}

impl MockInstruments {
    pub fn with_name(mut self, code: &str, name: &str) -> Self {
        self.names.insert(code.to_string(), name.to_string());
        self
    }
}

impl InstrumentPort for MockInstruments {
    fn load_names(&self) -> Result<HashMap<String, String>, ScreenerError> {
        Ok(self.names.clone())
    }
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn at(s: &str, hh_mm: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(&format!("{s} {hh_mm}"), "%Y-%m-%d %H:%M").unwrap()
}

/// `n` consecutive weekdays ending on `last` (inclusive), ascending.
pub fn weekdays_ending(last: NaiveDate, n: usize) -> Vec<NaiveDate> {
    let mut dates = Vec::with_capacity(n);
    let mut d = last;
    while dates.len() < n {
        if !matches!(d.weekday(), Weekday::Sat | Weekday::Sun) {
            dates.push(d);
        }
        d = d.checked_sub_days(Days::new(1)).unwrap();
    }
    dates.reverse();
    dates
}

fn cell(v: Option<f64>) -> Option<String> {
    v.map(|v| v.to_string())
}

/// Canonical history table builder: `(code, date, close, volume, pct_change)`.
pub fn history_table(rows: &[(&str, NaiveDate, Option<f64>, Option<f64>, Option<f64>)]) -> Table {
    let mut t = Table::new(
        ["code", "date", "close", "volume", "pct_change"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
    );
    for (code, d, close, volume, pct) in rows {
        t.push_row(vec![
            Some(code.to_string()),
            Some(d.format("%Y-%m-%d").to_string()),
            cell(*close),
            cell(*volume),
            cell(*pct),
        ]);
    }
    t
}

/// Quote feed table with the feed's native headers:
/// `(raw code, name, price, volume, pct_change)`.
pub fn quote_table(rows: &[(&str, &str, f64, f64, f64)]) -> Table {
    let mut t = Table::new(
        ["代码", "名称", "最新价", "成交量", "涨跌幅"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
    );
    for (code, name, price, volume, pct) in rows {
        t.push_row(vec![
            Some(code.to_string()),
            Some(name.to_string()),
            Some(price.to_string()),
            Some(volume.to_string()),
            Some(pct.to_string()),
        ]);
    }
    t
}

pub fn fast_settings(attempts: u32) -> SnapshotSettings {
    SnapshotSettings {
        retry: RetryPolicy {
            max_attempts: attempts,
            min_interval: Duration::ZERO,
            max_interval: Duration::ZERO,
        },
        ..SnapshotSettings::default()
    }
}
