//! Technical indicators used by the selection strategies.
//!
//! Series are positionally aligned with their input: element `i` of an
//! indicator belongs to bar `i`. A `None` means the value is not defined
//! there (warmup, or a null input inside the window).

pub mod sma;
pub mod weekly;

pub use sma::{closes, sma, volumes};
pub use weekly::{resample_weekly, WeeklyBar};
