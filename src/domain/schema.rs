//! Canonical schema normalization.
//!
//! Maps provider-specific column names onto the fixed [`Field`] set and
//! canonicalizes instrument identifiers to `CODE.EXCHANGE`.

use crate::domain::error::ScreenerError;
use crate::domain::table::Table;

/// Fewer resolved fields than this means the source is not usable.
pub const MIN_RESOLVED_FIELDS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Code,
    Name,
    Date,
    Open,
    Close,
    High,
    Low,
    Volume,
    Amount,
    PctChange,
}

impl Field {
    pub const ALL: [Field; 10] = [
        Field::Code,
        Field::Name,
        Field::Date,
        Field::Open,
        Field::Close,
        Field::High,
        Field::Low,
        Field::Volume,
        Field::Amount,
        Field::PctChange,
    ];

    /// Canonical column name.
    pub fn column(self) -> &'static str {
        match self {
            Field::Code => "code",
            Field::Name => "name",
            Field::Date => "date",
            Field::Open => "open",
            Field::Close => "close",
            Field::High => "high",
            Field::Low => "low",
            Field::Volume => "volume",
            Field::Amount => "amount",
            Field::PctChange => "pct_change",
        }
    }

    /// Accepted source names, highest priority first. The canonical name
    /// always leads so a normalized table normalizes to itself.
    pub fn accepted_names(self) -> &'static [&'static str] {
        match self {
            Field::Code => &["code", "代码", "symbol", "ts_code"],
            Field::Name => &["name", "名称"],
            Field::Date => &["date", "日期", "trade_date"],
            Field::Open => &["open", "今开", "开盘"],
            Field::Close => &["close", "最新价", "收盘", "price"],
            Field::High => &["high", "最高"],
            Field::Low => &["low", "最低"],
            Field::Volume => &["volume", "成交量", "vol"],
            Field::Amount => &["amount", "成交额"],
            Field::PctChange => &["pct_change", "涨跌幅", "changepercent", "pct_chg"],
        }
    }
}

/// Resolves each canonical field to the first accepted source column
/// present in `columns`. Matching ignores ASCII case and surrounding space.
pub fn resolve_columns(columns: &[String]) -> Vec<(Field, usize)> {
    Field::ALL
        .iter()
        .filter_map(|&field| {
            field.accepted_names().iter().find_map(|name| {
                columns
                    .iter()
                    .position(|c| c.trim().eq_ignore_ascii_case(name))
                    .map(|idx| (field, idx))
            })
        })
        .collect()
}

/// Renames a raw table onto the canonical field set, dropping unrecognized
/// columns and canonicalizing the code column.
pub fn normalize(raw: &Table) -> Result<Table, ScreenerError> {
    let resolved = resolve_columns(raw.columns());
    if resolved.len() < MIN_RESOLVED_FIELDS {
        return Err(ScreenerError::SchemaIncomplete {
            resolved: resolved.len(),
            required: MIN_RESOLVED_FIELDS,
        });
    }

    let mut table = Table::new(
        resolved
            .iter()
            .map(|(field, _)| field.column().to_string())
            .collect(),
    );
    for row in raw.rows() {
        table.push_row(resolved.iter().map(|(_, idx)| row[*idx].clone()).collect());
    }

    if table.has_column(Field::Code.column()) {
        table.map_column(Field::Code.column(), |code| code.map(normalize_code));
    }
    Ok(table)
}

/// Canonicalizes an instrument identifier.
///
/// Leading digit 6 or 9 maps to `.SH`, 0 or 3 to `.SZ`; anything else
/// passes through unsuffixed. Already-suffixed codes are only upper-cased,
/// so the function is idempotent. All-digit codes shorter than six digits
/// are zero-padded first (numeric columns lose leading zeros).
pub fn normalize_code(raw: &str) -> String {
    let code = raw.trim().to_uppercase();
    if code.contains('.') || code.is_empty() {
        return code;
    }
    let code = if code.len() < 6 && code.chars().all(|c| c.is_ascii_digit()) {
        format!("{:0>6}", code)
    } else {
        code
    };
    match code.as_bytes()[0] {
        b'6' | b'9' => format!("{}.SH", code),
        b'0' | b'3' => format!("{}.SZ", code),
        _ => code,
    }
}
