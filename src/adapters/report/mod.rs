//! Selection result reports: the terminal table and the CSV result file.

pub mod tables;

use crate::domain::engine::SelectionRow;
use crate::domain::error::ScreenerError;
use crate::domain::strategy::Strategy;
use crate::ports::report_port::ReportPort;
use std::fs::{self, File};
use std::path::Path;
use tracing::info;

/// Writes results as CSV, one row per matched instrument.
pub struct CsvReportAdapter {
    with_metrics: bool,
}

impl CsvReportAdapter {
    pub fn new(with_metrics: bool) -> Self {
        Self { with_metrics }
    }
}

impl Default for CsvReportAdapter {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(
        &self,
        rows: &[SelectionRow],
        strategy: &Strategy,
        output_path: &Path,
    ) -> Result<(), ScreenerError> {
        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let (header, records) = tables::to_records(rows, self.with_metrics);

        let mut wtr = csv::Writer::from_writer(File::create(output_path)?);
        wtr.write_record(&header).map_err(std::io::Error::from)?;
        for record in &records {
            wtr.write_record(record.iter().map(|c| c.as_deref().unwrap_or("")))
                .map_err(std::io::Error::from)?;
        }
        wtr.flush()?;

        info!(
            path = %output_path.display(),
            rows = rows.len(),
            strategy = strategy.name(),
            "results written"
        );
        Ok(())
    }
}
