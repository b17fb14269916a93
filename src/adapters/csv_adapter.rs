//! CSV file adapters: historical dataset, quote feed drop file, snapshot
//! cache and the stock pool reference list.

use crate::domain::error::ScreenerError;
use crate::domain::schema::normalize_code;
use crate::domain::table::Table;
use crate::ports::history_port::HistoryPort;
use crate::ports::instrument_port::InstrumentPort;
use crate::ports::quote_port::{CachedSnapshot, QuoteFeedPort, SnapshotCachePort};
use chrono::NaiveDateTime;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const FETCHED_AT: &str = "fetched_at";
const FETCHED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn read_table(path: &Path) -> Result<Table, String> {
    let file = File::open(path).map_err(|e| e.to_string())?;
    Table::from_csv_reader(file).map_err(|e| e.to_string())
}

/// One CSV holding every instrument's daily bars.
pub struct CsvHistoryAdapter {
    path: PathBuf,
}

impl CsvHistoryAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl HistoryPort for CsvHistoryAdapter {
    fn source(&self) -> String {
        self.path.display().to_string()
    }

    fn load_raw(&self) -> Result<Table, ScreenerError> {
        read_table(&self.path).map_err(|reason| ScreenerError::DatasetUnavailable {
            path: self.source(),
            reason,
        })
    }
}

/// Reads the file the external quote downloader drops. A missing or
/// half-written file is a transient feed failure.
pub struct CsvQuoteFeed {
    path: PathBuf,
}

impl CsvQuoteFeed {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl QuoteFeedPort for CsvQuoteFeed {
    fn fetch_quotes(&self) -> Result<Table, ScreenerError> {
        let table = read_table(&self.path).map_err(|reason| ScreenerError::Feed {
            reason: format!("{}: {}", self.path.display(), reason),
        })?;
        if table.is_empty() {
            return Err(ScreenerError::Feed {
                reason: format!("{}: no quotes", self.path.display()),
            });
        }
        debug!(path = %self.path.display(), rows = table.len(), "quote file read");
        Ok(table)
    }
}

/// Canonical snapshot columns plus a `fetched_at` column.
pub struct CsvSnapshotCache {
    path: PathBuf,
}

impl CsvSnapshotCache {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl SnapshotCachePort for CsvSnapshotCache {
    fn load(&self) -> Result<Option<CachedSnapshot>, ScreenerError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let file = File::open(&self.path)?;
        let mut table = Table::from_csv_reader(file).map_err(std::io::Error::from)?;

        let stamp = table
            .remove_column(FETCHED_AT)
            .and_then(|cells| cells.into_iter().flatten().next());
        let fetched_at =
            stamp.and_then(|s| NaiveDateTime::parse_from_str(&s, FETCHED_AT_FORMAT).ok());
        match fetched_at {
            Some(fetched_at) => Ok(Some(CachedSnapshot { fetched_at, table })),
            None => {
                warn!(path = %self.path.display(), "snapshot cache has no fetch time, ignoring");
                Ok(None)
            }
        }
    }

    fn store(&self, snapshot: &CachedSnapshot) -> Result<(), ScreenerError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut table = snapshot.table.clone();
        let stamp = snapshot.fetched_at.format(FETCHED_AT_FORMAT).to_string();
        table.map_column(FETCHED_AT, |_| Some(stamp.clone()));
        let file = File::create(&self.path)?;
        table.write_csv(file).map_err(std::io::Error::from)?;
        debug!(path = %self.path.display(), rows = table.len(), "snapshot cache written");
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct PoolRecord {
    #[serde(alias = "code", alias = "代码", alias = "symbol")]
    ts_code: String,
    #[serde(default, alias = "名称")]
    name: String,
}

/// The stock pool list: code to display name.
pub struct CsvInstrumentAdapter {
    path: PathBuf,
}

impl CsvInstrumentAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl InstrumentPort for CsvInstrumentAdapter {
    /// A missing pool file yields no names; results just go unnamed.
    fn load_names(&self) -> Result<HashMap<String, String>, ScreenerError> {
        if !self.path.exists() {
            warn!(path = %self.path.display(), "stock pool not found, names will be empty");
            return Ok(HashMap::new());
        }
        let mut rdr = csv::Reader::from_path(&self.path).map_err(std::io::Error::from)?;
        let mut names = HashMap::new();
        for (line, record) in rdr.deserialize::<PoolRecord>().enumerate() {
            match record {
                Ok(r) => {
                    names.insert(normalize_code(&r.ts_code), r.name.trim().to_string());
                }
                Err(e) => warn!(line = line + 2, error = %e, "skipping stock pool row"),
            }
        }
        Ok(names)
    }
}
