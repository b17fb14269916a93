//! Concrete adapter implementations for ports.

pub mod csv_adapter;
pub mod file_config_adapter;
pub mod report;
#[cfg(feature = "sqlite")]
pub mod sqlite_adapter;
