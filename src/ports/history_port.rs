//! Historical dataset access port.

use crate::domain::error::ScreenerError;
use crate::domain::table::Table;

pub trait HistoryPort {
    /// Human-readable location of the dataset, used in logs and errors.
    fn source(&self) -> String;

    /// Reads every stored bar across all instruments, columns as stored.
    ///
    /// A missing or unreadable store is [`ScreenerError::DatasetUnavailable`].
    fn load_raw(&self) -> Result<Table, ScreenerError>;
}
