//! Result table formatting.
//!
//! Columns are the fixed row fields followed by every evidence key that
//! appears in any row, in key order. Numbers are rounded to two decimals;
//! a null renders as `-` on the console and as an empty cell in CSV.

use crate::domain::engine::SelectionRow;
use std::collections::BTreeSet;

pub const FIXED_COLUMNS: [&str; 5] = ["code", "name", "trigger_date", "latest_price", "pct_change"];

pub fn metric_columns(rows: &[SelectionRow]) -> Vec<String> {
    let keys: BTreeSet<&String> = rows.iter().flat_map(|r| r.metrics.keys()).collect();
    keys.into_iter().cloned().collect()
}

pub fn format_number(value: Option<f64>) -> Option<String> {
    value.map(|v| format!("{:.2}", v))
}

/// Header plus one record per row, nulls as `None`.
pub fn to_records(rows: &[SelectionRow], with_metrics: bool) -> (Vec<String>, Vec<Vec<Option<String>>>) {
    let metrics = if with_metrics {
        metric_columns(rows)
    } else {
        Vec::new()
    };
    let mut header: Vec<String> = FIXED_COLUMNS.iter().map(|c| c.to_string()).collect();
    header.extend(metrics.iter().cloned());

    let records = rows
        .iter()
        .map(|row| {
            let mut record = vec![
                Some(row.code.clone()),
                Some(row.name.clone()).filter(|n| !n.is_empty()),
                row.trigger_date.map(|d| d.format("%Y-%m-%d").to_string()),
                format_number(row.latest_price),
                format_number(row.pct_change),
            ];
            record.extend(
                metrics
                    .iter()
                    .map(|key| format_number(row.metrics.get(key).copied().flatten())),
            );
            record
        })
        .collect();
    (header, records)
}

/// Plain-text aligned table for the terminal.
pub fn render_table(rows: &[SelectionRow], strategy: &str, with_metrics: bool) -> String {
    if rows.is_empty() {
        return format!("No instruments matched {}.\n", strategy);
    }
    let (header, records) = to_records(rows, with_metrics);
    let cells: Vec<Vec<String>> = records
        .into_iter()
        .map(|r| r.into_iter().map(|c| c.unwrap_or_else(|| "-".to_string())).collect())
        .collect();

    let mut widths: Vec<usize> = header.iter().map(|h| display_width(h)).collect();
    for row in &cells {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(display_width(cell));
        }
    }

    let mut out = String::new();
    push_line(&mut out, &header, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_line(&mut out, &rule, &widths);
    for row in &cells {
        push_line(&mut out, row, &widths);
    }
    out.push_str(&format!("{} instrument(s) matched {}.\n", rows.len(), strategy));
    out
}

/// Terminal columns taken by `s`; CJK and fullwidth characters take two.
pub fn display_width(s: &str) -> usize {
    s.chars().map(|c| if is_wide(c) { 2 } else { 1 }).sum()
}

fn is_wide(c: char) -> bool {
    matches!(c as u32,
        0x1100..=0x115F   // Hangul Jamo
        | 0x2E80..=0x303E // CJK radicals, punctuation
        | 0x3041..=0x33FF // kana, CJK compatibility
        | 0x3400..=0x4DBF // CJK extension A
        | 0x4E00..=0x9FFF // CJK unified ideographs
        | 0xAC00..=0xD7A3 // Hangul syllables
        | 0xF900..=0xFAFF
        | 0xFE30..=0xFE4F
        | 0xFF00..=0xFF60 // fullwidth forms
        | 0xFFE0..=0xFFE6
        | 0x20000..=0x3FFFD)
}

fn push_line(out: &mut String, cells: &[String], widths: &[usize]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(c, w)| {
            let pad = w.saturating_sub(display_width(c));
            format!("{}{}", c, " ".repeat(pad))
        })
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}
