//! Live quote feed and snapshot cache ports.

use crate::domain::error::ScreenerError;
use crate::domain::table::Table;
use chrono::NaiveDateTime;

/// The upstream market-data collaborator. Returns one row per instrument in
/// the provider's own column naming.
pub trait QuoteFeedPort {
    /// Transient failures are reported as [`ScreenerError::Feed`].
    fn fetch_quotes(&self) -> Result<Table, ScreenerError>;
}

/// A canonical snapshot together with the moment it was fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedSnapshot {
    pub fetched_at: NaiveDateTime,
    pub table: Table,
}

pub trait SnapshotCachePort {
    /// `Ok(None)` when nothing has been cached yet.
    fn load(&self) -> Result<Option<CachedSnapshot>, ScreenerError>;

    fn store(&self, snapshot: &CachedSnapshot) -> Result<(), ScreenerError>;
}
