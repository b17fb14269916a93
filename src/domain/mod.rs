//! Core domain types and logic.

pub mod aligner;
pub mod bar;
pub mod cancel;
pub mod config_validation;
pub mod engine;
pub mod error;
pub mod history;
pub mod indicator;
pub mod schema;
pub mod snapshot;
pub mod strategy;
pub mod table;
pub mod window;
