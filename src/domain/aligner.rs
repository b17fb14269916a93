//! Field alignment between the historical and live tables.

use crate::domain::table::Table;
use std::collections::BTreeSet;

/// Gives both tables the union of their columns, in lexicographic order,
/// with nulls wherever a table lacked a column.
pub fn align_fields(history: &Table, snapshot: &Table) -> (Table, Table) {
    let union: BTreeSet<&String> = history
        .columns()
        .iter()
        .chain(snapshot.columns().iter())
        .collect();
    let columns: Vec<String> = union.into_iter().cloned().collect();
    (history.select(&columns), snapshot.select(&columns))
}

/// Per-column presence in each source, for the pre-alignment field report.
pub fn field_presence(history: &Table, snapshot: &Table) -> Vec<(String, bool, bool)> {
    let union: BTreeSet<&String> = history
        .columns()
        .iter()
        .chain(snapshot.columns().iter())
        .collect();
    union
        .into_iter()
        .map(|c| (c.clone(), history.has_column(c), snapshot.has_column(c)))
        .collect()
}
