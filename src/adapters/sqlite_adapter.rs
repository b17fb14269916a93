//! SQLite historical store.
//!
//! One `daily_bars` table keyed by `(code, date)` holding canonical fields.

use crate::domain::bar::Bar;
use crate::domain::error::ScreenerError;
use crate::domain::schema::Field;
use crate::domain::table::Table;
use crate::ports::config_port::ConfigPort;
use crate::ports::history_port::HistoryPort;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use std::path::Path;
use tracing::info;

const COLUMNS: [Field; 9] = [
    Field::Code,
    Field::Date,
    Field::Open,
    Field::Close,
    Field::High,
    Field::Low,
    Field::Volume,
    Field::Amount,
    Field::PctChange,
];

pub struct SqliteHistoryAdapter {
    pool: Pool<SqliteConnectionManager>,
    source: String,
}

fn query_err(e: rusqlite::Error) -> ScreenerError {
    ScreenerError::DatabaseQuery {
        reason: e.to_string(),
    }
}

impl SqliteHistoryAdapter {
    /// Opens the existing store named by `[data] history_path`.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, ScreenerError> {
        let db_path = config.require_string("data", "history_path")?;
        if !Path::new(&db_path).exists() {
            return Err(ScreenerError::DatasetUnavailable {
                path: db_path,
                reason: "database file not found".into(),
            });
        }
        let pool_size = config.get_int("data", "sqlite_pool_size", 4).max(1) as u32;
        Self::open(Path::new(&db_path), pool_size)
    }

    /// Opens or creates a store at `path` with the schema in place.
    pub fn create(path: &Path, pool_size: u32) -> Result<Self, ScreenerError> {
        let adapter = Self::open(path, pool_size)?;
        adapter.initialize_schema()?;
        Ok(adapter)
    }

    fn open(path: &Path, pool_size: u32) -> Result<Self, ScreenerError> {
        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(|e: r2d2::Error| ScreenerError::Database {
                reason: e.to_string(),
            })?;
        Ok(Self {
            pool,
            source: path.display().to_string(),
        })
    }

    pub fn in_memory() -> Result<Self, ScreenerError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| ScreenerError::Database {
                reason: e.to_string(),
            })?;
        Ok(Self {
            pool,
            source: ":memory:".to_string(),
        })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, ScreenerError> {
        self.pool.get().map_err(|e: r2d2::Error| ScreenerError::Database {
            reason: e.to_string(),
        })
    }

    pub fn initialize_schema(&self) -> Result<(), ScreenerError> {
        self.conn()?
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS daily_bars (
                    code TEXT NOT NULL,
                    date TEXT NOT NULL,
                    open REAL,
                    close REAL,
                    high REAL,
                    low REAL,
                    volume REAL,
                    amount REAL,
                    pct_change REAL,
                    PRIMARY KEY (code, date)
                );
                CREATE INDEX IF NOT EXISTS idx_daily_bars_date ON daily_bars(date);",
            )
            .map_err(query_err)
    }

    /// Upserts `bars`; a bar for an existing `(code, date)` replaces it.
    pub fn insert_bars(&self, bars: &[Bar]) -> Result<usize, ScreenerError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_err)?;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT OR REPLACE INTO daily_bars
                     (code, date, open, close, high, low, volume, amount, pct_change)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                )
                .map_err(query_err)?;
            for bar in bars {
                stmt.execute(params![
                    bar.code,
                    bar.date.format("%Y-%m-%d").to_string(),
                    bar.open,
                    bar.close,
                    bar.high,
                    bar.low,
                    bar.volume,
                    bar.amount,
                    bar.pct_change,
                ])
                .map_err(query_err)?;
            }
        }
        tx.commit().map_err(query_err)?;
        info!(source = %self.source, bars = bars.len(), "bars stored");
        Ok(bars.len())
    }
}

fn number(value: Option<f64>) -> Option<String> {
    value.map(|v| v.to_string())
}

impl HistoryPort for SqliteHistoryAdapter {
    fn source(&self) -> String {
        self.source.clone()
    }

    fn load_raw(&self) -> Result<Table, ScreenerError> {
        let unavailable = |e: rusqlite::Error| ScreenerError::DatasetUnavailable {
            path: self.source.clone(),
            reason: e.to_string(),
        };
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT code, date, open, close, high, low, volume, amount, pct_change
                 FROM daily_bars ORDER BY code, date",
            )
            .map_err(unavailable)?;

        let rows = stmt
            .query_map([], |row| {
                let mut cells: Vec<Option<String>> = vec![row.get(0)?, row.get(1)?];
                for i in 2..COLUMNS.len() {
                    cells.push(number(row.get::<_, Option<f64>>(i)?));
                }
                Ok(cells)
            })
            .map_err(unavailable)?;

        let mut table = Table::new(COLUMNS.iter().map(|f| f.column().to_string()).collect());
        for row in rows {
            table.push_row(row.map_err(query_err)?);
        }
        Ok(table)
    }
}
