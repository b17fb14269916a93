//! Instrument reference data port.

use crate::domain::error::ScreenerError;
use std::collections::HashMap;

pub trait InstrumentPort {
    /// Canonical code to display name.
    fn load_names(&self) -> Result<HashMap<String, String>, ScreenerError>;
}
