//! Live snapshot provider.
//!
//! Wraps the external quote feed behind one retry and cache policy:
//!
//! - a cache entry younger than the phase-dependent TTL is served as is
//!   (long TTL once the market has closed, short while it trades);
//! - otherwise the feed is polled with exponential backoff up to
//!   `max_attempts` times;
//! - when every attempt fails, the newest cache entry of any age is used,
//!   and only without one is the snapshot unavailable.
//!
//! Within one provider the snapshot is fetched at most once unless a
//! refresh is forced.

use crate::domain::bar::parse_number;
use crate::domain::cancel::CancellationToken;
use crate::domain::error::ScreenerError;
use crate::domain::schema::{self, Field};
use crate::domain::table::Table;
use crate::ports::quote_port::{CachedSnapshot, QuoteFeedPort, SnapshotCachePort};
use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use std::cell::RefCell;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub min_interval: Duration,
    pub max_interval: Duration,
}

impl RetryPolicy {
    /// Wait after failed attempt `attempt` (0-based): `min * 2^attempt`,
    /// capped at `max`.
    pub fn delay(&self, attempt: u32) -> Duration {
        2u32.checked_pow(attempt)
            .and_then(|factor| self.min_interval.checked_mul(factor))
            .unwrap_or(self.max_interval)
            .min(self.max_interval)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            min_interval: Duration::from_secs(2),
            max_interval: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotSettings {
    pub retry: RetryPolicy,
    pub open_ttl: chrono::Duration,
    pub closed_ttl: chrono::Duration,
    pub close_time: NaiveTime,
    /// Applied to live volumes so they share the historical unit
    /// (100 converts board lots to shares).
    pub volume_multiplier: f64,
}

impl Default for SnapshotSettings {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            open_ttl: chrono::Duration::minutes(2),
            closed_ttl: chrono::Duration::minutes(12 * 60),
            close_time: NaiveTime::from_hms_opt(15, 5, 0).unwrap_or(NaiveTime::MIN),
            volume_multiplier: 1.0,
        }
    }
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Post-close quotes are final for the day.
pub fn is_market_closed(now: NaiveDateTime, close_time: NaiveTime) -> bool {
    is_weekend(now.date()) || now.time() >= close_time
}

/// The session a snapshot taken at `now` belongs to: today on weekdays,
/// the preceding Friday at weekends.
pub fn trading_date(now: NaiveDateTime) -> NaiveDate {
    let date = now.date();
    let back = match date.weekday() {
        Weekday::Sat => 1,
        Weekday::Sun => 2,
        _ => 0,
    };
    date.checked_sub_days(Days::new(back)).unwrap_or(date)
}

pub struct SnapshotProvider<'a> {
    feed: &'a dyn QuoteFeedPort,
    cache: &'a dyn SnapshotCachePort,
    settings: SnapshotSettings,
    current: RefCell<Option<Table>>,
}

impl<'a> SnapshotProvider<'a> {
    pub fn new(
        feed: &'a dyn QuoteFeedPort,
        cache: &'a dyn SnapshotCachePort,
        settings: SnapshotSettings,
    ) -> Self {
        Self {
            feed,
            cache,
            settings,
            current: RefCell::new(None),
        }
    }

    pub fn settings(&self) -> &SnapshotSettings {
        &self.settings
    }

    pub fn ttl_at(&self, now: NaiveDateTime) -> chrono::Duration {
        if is_market_closed(now, self.settings.close_time) {
            self.settings.closed_ttl
        } else {
            self.settings.open_ttl
        }
    }

    /// Today's canonical snapshot table, one row per instrument.
    pub fn snapshot(
        &self,
        now: NaiveDateTime,
        force_refresh: bool,
        cancel: &CancellationToken,
    ) -> Result<Table, ScreenerError> {
        if !force_refresh {
            if let Some(table) = self.current.borrow().as_ref() {
                return Ok(table.clone());
            }
            if let Some(cached) = self.load_cache() {
                let age = now - cached.fetched_at;
                if age >= chrono::Duration::zero() && age < self.ttl_at(now) {
                    info!(fetched_at = %cached.fetched_at, "using cached snapshot");
                    *self.current.borrow_mut() = Some(cached.table.clone());
                    return Ok(cached.table);
                }
                debug!(fetched_at = %cached.fetched_at, "cached snapshot expired");
            }
        }

        let table = self.fetch_with_retry(now, cancel)?;
        *self.current.borrow_mut() = Some(table.clone());
        Ok(table)
    }

    fn fetch_with_retry(
        &self,
        now: NaiveDateTime,
        cancel: &CancellationToken,
    ) -> Result<Table, ScreenerError> {
        let attempts = self.settings.retry.max_attempts.max(1);
        let mut last_error = None;

        for attempt in 0..attempts {
            cancel.check()?;
            if attempt > 0 {
                debug!(attempt, "retrying quote feed");
            }
            match self
                .feed
                .fetch_quotes()
                .and_then(|raw| self.prepare(&raw, now))
            {
                Ok(table) => {
                    let entry = CachedSnapshot {
                        fetched_at: now,
                        table: table.clone(),
                    };
                    if let Err(e) = self.cache.store(&entry) {
                        warn!(error = %e, "failed to write snapshot cache");
                    }
                    info!(instruments = table.len(), "live snapshot fetched");
                    return Ok(table);
                }
                Err(e) => {
                    warn!(attempt = attempt + 1, error = %e, "quote feed request failed");
                    last_error = Some(e);
                    if attempt + 1 < attempts {
                        std::thread::sleep(self.settings.retry.delay(attempt));
                    }
                }
            }
        }

        match self.load_cache() {
            Some(cached) => {
                warn!(
                    fetched_at = %cached.fetched_at,
                    "quote feed retries exhausted, falling back to cached snapshot"
                );
                Ok(cached.table)
            }
            None => Err(ScreenerError::SnapshotUnavailable {
                reason: last_error
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "no attempts made".to_string()),
            }),
        }
    }

    /// Canonicalizes a raw feed table: normalized columns and codes, every
    /// row dated with the trading date, volumes scaled.
    pub fn prepare(&self, raw: &Table, now: NaiveDateTime) -> Result<Table, ScreenerError> {
        let mut table = schema::normalize(raw)?;
        if !table.has_column(Field::Code.column()) {
            return Err(ScreenerError::SnapshotUnavailable {
                reason: "quote feed has no code column".to_string(),
            });
        }
        table.retain_rows(|t, i| t.cell(i, Field::Code.column()).is_some());

        let date = trading_date(now).format("%Y-%m-%d").to_string();
        table.map_column(Field::Date.column(), |_| Some(date.clone()));

        let multiplier = self.settings.volume_multiplier;
        if multiplier != 1.0 && table.has_column(Field::Volume.column()) {
            table.map_column(Field::Volume.column(), |v| {
                v.and_then(parse_number).map(|v| (v * multiplier).to_string())
            });
        }
        Ok(table)
    }

    fn load_cache(&self) -> Option<CachedSnapshot> {
        match self.cache.load() {
            Ok(cached) => cached,
            Err(e) => {
                warn!(error = %e, "failed to read snapshot cache");
                None
            }
        }
    }
}
