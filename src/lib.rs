//! dailyscreen: end-of-day A-share stock screener.
//!
//! Merges a stored daily-bar history with today's live quote snapshot and
//! runs one selection strategy over every instrument.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`], command dispatch in [`cli`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;
