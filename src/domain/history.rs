//! Historical dataset validation and summaries.
//!
//! Storage adapters hand over whatever columns they hold; everything here
//! turns that into the canonical, validated table the pipeline consumes.

use crate::domain::bar::parse_date;
use crate::domain::error::ScreenerError;
use crate::domain::schema::{self, Field};
use crate::domain::table::Table;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Normalizes a raw historical table and checks it is usable.
///
/// The code and date columns are mandatory. Rows with a blank code or an
/// unparseable date are dropped; dates are rewritten as `YYYY-MM-DD`.
pub fn validate_history(raw: &Table, source: &str) -> Result<Table, ScreenerError> {
    let mut table = schema::normalize(raw).map_err(|e| ScreenerError::DatasetUnavailable {
        path: source.to_string(),
        reason: e.to_string(),
    })?;

    for field in [Field::Code, Field::Date] {
        if !table.has_column(field.column()) {
            return Err(ScreenerError::DatasetUnavailable {
                path: source.to_string(),
                reason: format!("missing {} column", field.column()),
            });
        }
    }

    let before = table.len();
    table.retain_rows(|t, i| {
        t.cell(i, Field::Code.column()).is_some()
            && t.cell(i, Field::Date.column()).and_then(parse_date).is_some()
    });
    let dropped = before - table.len();
    if dropped > 0 {
        warn!(source, dropped, "dropped historical rows without a code or valid date");
    }

    table.map_column(Field::Date.column(), |raw| {
        raw.and_then(parse_date)
            .map(|d| d.format("%Y-%m-%d").to_string())
    });

    info!(source, rows = table.len(), "historical dataset loaded");
    Ok(table)
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentSummary {
    pub code: String,
    pub bars: usize,
    pub first: NaiveDate,
    pub last: NaiveDate,
}

/// Per-instrument bar count and date range of a validated table.
pub fn summarize(table: &Table) -> Vec<InstrumentSummary> {
    let mut by_code: BTreeMap<&str, InstrumentSummary> = BTreeMap::new();
    for i in 0..table.len() {
        let (Some(code), Some(date)) = (
            table.cell(i, Field::Code.column()),
            table.cell(i, Field::Date.column()).and_then(parse_date),
        ) else {
            continue;
        };
        by_code
            .entry(code)
            .and_modify(|s| {
                s.bars += 1;
                s.first = s.first.min(date);
                s.last = s.last.max(date);
            })
            .or_insert_with(|| InstrumentSummary {
                code: code.to_string(),
                bars: 1,
                first: date,
                last: date,
            });
    }
    by_code.into_values().collect()
}
