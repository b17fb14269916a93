//! Selection result output port.

use crate::domain::engine::SelectionRow;
use crate::domain::error::ScreenerError;
use crate::domain::strategy::Strategy;
use std::path::Path;

/// Port for persisting one run's selection results.
pub trait ReportPort {
    fn write(
        &self,
        rows: &[SelectionRow],
        strategy: &Strategy,
        output_path: &Path,
    ) -> Result<(), ScreenerError>;
}
