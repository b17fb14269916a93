//! Loosely-typed columnar table used at the data boundary.
//!
//! Feeds and stores hand over rows keyed by provider-specific column names.
//! A [`Table`] carries them until the schema normalizer and the field
//! aligner have brought both sources onto the canonical column set, after
//! which rows are converted into typed [`Bar`](crate::domain::bar::Bar)s.

use std::io::{Read, Write};

/// A single cell. `None` is a null (missing or blank in the source).
pub type Cell = Option<String>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Appends a row, padding with nulls or truncating to the column count.
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.columns.len(), None);
        self.rows.push(row);
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)?.as_deref()
    }

    /// Rewrites every value of `column` through `f`. Adds the column first
    /// (all nulls) if it is missing.
    pub fn map_column<F>(&mut self, column: &str, mut f: F)
    where
        F: FnMut(Option<&str>) -> Cell,
    {
        let idx = match self.column_index(column) {
            Some(i) => i,
            None => {
                self.add_null_column(column);
                self.columns.len() - 1
            }
        };
        for row in &mut self.rows {
            row[idx] = f(row[idx].as_deref());
        }
    }

    pub fn add_null_column(&mut self, column: &str) {
        if self.has_column(column) {
            return;
        }
        self.columns.push(column.to_string());
        for row in &mut self.rows {
            row.push(None);
        }
    }

    pub fn remove_column(&mut self, column: &str) -> Option<Vec<Cell>> {
        let idx = self.column_index(column)?;
        self.columns.remove(idx);
        Some(self.rows.iter_mut().map(|row| row.remove(idx)).collect())
    }

    /// Projects onto `columns` in the given order. Columns this table does
    /// not have come back as nulls.
    pub fn select(&self, columns: &[String]) -> Table {
        let indices: Vec<Option<usize>> = columns.iter().map(|c| self.column_index(c)).collect();
        let rows = self
            .rows
            .iter()
            .map(|row| {
                indices
                    .iter()
                    .map(|idx| idx.and_then(|i| row[i].clone()))
                    .collect()
            })
            .collect();
        Table {
            columns: columns.to_vec(),
            rows,
        }
    }

    /// Keeps only rows for which `keep` returns true.
    pub fn retain_rows<F>(&mut self, mut keep: F)
    where
        F: FnMut(&Table, usize) -> bool,
    {
        let mut kept = Vec::with_capacity(self.rows.len());
        for i in 0..self.rows.len() {
            if keep(self, i) {
                kept.push(i);
            }
        }
        let mut rows = std::mem::take(&mut self.rows);
        self.rows = kept
            .into_iter()
            .map(|i| std::mem::take(&mut rows[i]))
            .collect();
    }

    /// Reads a headed CSV. Blank cells and the usual textual NaN markers
    /// become nulls.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Table, csv::Error> {
        let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let columns: Vec<String> = rdr
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();
        let mut table = Table::new(columns);
        for record in rdr.records() {
            let record = record?;
            table.push_row(record.iter().map(parse_cell).collect());
        }
        Ok(table)
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(&self.columns)?;
        for row in &self.rows {
            wtr.write_record(row.iter().map(|c| c.as_deref().unwrap_or("")))?;
        }
        wtr.flush()?;
        Ok(())
    }
}

fn parse_cell(raw: &str) -> Cell {
    let trimmed = raw.trim();
    match trimmed {
        "" | "nan" | "NaN" | "None" | "null" | "-" => None,
        _ => Some(trimmed.to_string()),
    }
}
