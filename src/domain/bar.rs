//! Daily bar representation.

use crate::domain::error::ScreenerError;
use crate::domain::schema::Field;
use crate::domain::table::Table;
use chrono::{NaiveDate, NaiveDateTime};

/// One instrument on one calendar date. Every numeric field is nullable
/// because a source may omit it.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub code: String,
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub close: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub volume: Option<f64>,
    pub amount: Option<f64>,
    /// Percent change against the prior bar, in percent units (9.9 = +9.9%).
    pub pct_change: Option<f64>,
}

impl Bar {
    pub fn new(code: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            code: code.into(),
            date,
            open: None,
            close: None,
            high: None,
            low: None,
            volume: None,
            amount: None,
            pct_change: None,
        }
    }

    /// Builds a bar from row `row` of a canonical table. `default_date` is
    /// used when the row carries no date at all.
    pub fn from_row(
        table: &Table,
        row: usize,
        default_date: Option<NaiveDate>,
    ) -> Result<Bar, ScreenerError> {
        let code = table
            .cell(row, Field::Code.column())
            .ok_or_else(|| ScreenerError::InvalidRecord {
                code: "?".into(),
                reason: format!("row {} has no code", row),
            })?
            .to_string();

        let date = match table.cell(row, Field::Date.column()) {
            Some(raw) => parse_date(raw).ok_or_else(|| ScreenerError::InvalidRecord {
                code: code.clone(),
                reason: format!("invalid date '{}'", raw),
            })?,
            None => default_date.ok_or_else(|| ScreenerError::InvalidRecord {
                code: code.clone(),
                reason: "missing date".into(),
            })?,
        };

        let num = |field: Field| table.cell(row, field.column()).and_then(parse_number);

        Ok(Bar {
            date,
            open: num(Field::Open),
            close: num(Field::Close),
            high: num(Field::High),
            low: num(Field::Low),
            volume: num(Field::Volume),
            amount: num(Field::Amount),
            pct_change: num(Field::PctChange),
            code,
        })
    }
}

/// Accepts the date layouts the stores and feeds are known to emit.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    for fmt in ["%Y-%m-%d", "%Y%m%d", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(d);
        }
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.date());
        }
    }
    None
}

/// Lenient numeric parse. Malformed values are nulls, not errors.
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .trim_end_matches('%')
        .chars()
        .filter(|c| *c != ',')
        .collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canonical_table() -> Table {
        let cols = ["code", "date", "close", "volume", "pct_change"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        Table::new(cols)
    }

    #[test]
    fn from_row_parses_typed_fields() {
        let mut t = canonical_table();
        t.push_row(vec![
            Some("600000.SH".into()),
            Some("2024-01-15".into()),
            Some("10.52".into()),
            Some("1,200".into()),
            Some("9.98%".into()),
        ]);
        let bar = Bar::from_row(&t, 0, None).unwrap();
        assert_eq!(bar.code, "600000.SH");
        assert_eq!(bar.date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(bar.close, Some(10.52));
        assert_eq!(bar.volume, Some(1200.0));
        assert_eq!(bar.pct_change, Some(9.98));
        assert_eq!(bar.open, None);
    }

    #[test]
    fn malformed_number_becomes_null() {
        let mut t = canonical_table();
        t.push_row(vec![
            Some("600000.SH".into()),
            Some("2024-01-15".into()),
            Some("n/a".into()),
            None,
            None,
        ]);
        let bar = Bar::from_row(&t, 0, None).unwrap();
        assert_eq!(bar.close, None);
    }

    #[test]
    fn missing_date_uses_default() {
        let mut t = canonical_table();
        t.push_row(vec![Some("000001.SZ".into()), None, None, None, None]);
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(Bar::from_row(&t, 0, Some(today)).unwrap().date, today);
        assert!(Bar::from_row(&t, 0, None).is_err());
    }

    #[test]
    fn invalid_date_is_an_error() {
        let mut t = canonical_table();
        t.push_row(vec![
            Some("000001.SZ".into()),
            Some("yesterday".into()),
            None,
            None,
            None,
        ]);
        let err = Bar::from_row(&t, 0, None).unwrap_err();
        assert!(matches!(err, ScreenerError::InvalidRecord { code, .. } if code == "000001.SZ"));
    }

    #[test]
    fn parse_date_layouts() {
        let d = NaiveDate::from_ymd_opt(2024, 2, 9).unwrap();
        assert_eq!(parse_date("2024-02-09"), Some(d));
        assert_eq!(parse_date("20240209"), Some(d));
        assert_eq!(parse_date("2024/02/09"), Some(d));
        assert_eq!(parse_date("2024-02-09 00:00:00"), Some(d));
        assert_eq!(parse_date("Feb 9"), None);
    }

    #[test]
    fn parse_number_rejects_non_finite() {
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("-3.5"), Some(-3.5));
    }
}
