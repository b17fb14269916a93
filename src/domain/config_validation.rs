//! Configuration validation.
//!
//! Checks every section before any data is touched, so a bad value fails
//! the run up front instead of halfway through a fetch.

use crate::domain::error::ScreenerError;
use crate::domain::strategy::{Strategy, StrategyParams};
use crate::ports::config_port::ConfigPort;
use chrono::NaiveTime;

pub const HISTORY_BACKENDS: [&str; 2] = ["csv", "sqlite"];

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    validate_data_config(config)?;
    validate_snapshot_config(config)?;
    validate_strategy_config(config)?;
    Ok(())
}

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    config.require_string("data", "history_path")?;
    validate_backend(config)?;
    validate_at_least(config, "data", "sqlite_pool_size", 4, 1)?;
    Ok(())
}

pub fn validate_snapshot_config(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    config.require_string("snapshot", "feed_path")?;
    validate_at_least(config, "snapshot", "max_retries", 3, 1)?;
    validate_at_least(config, "snapshot", "min_interval_secs", 2, 0)?;
    validate_intervals(config)?;
    validate_at_least(config, "snapshot", "open_ttl_minutes", 2, 0)?;
    validate_at_least(config, "snapshot", "closed_ttl_minutes", 720, 0)?;
    validate_volume_multiplier(config)?;
    parse_close_time(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    validate_at_least(config, "strategy", "consecutive_days", 1, 1)?;
    let min_close = float_value(config, "strategy", "min_close", 100.0)?;
    if min_close < 0.0 {
        return Err(invalid("strategy", "min_close", "min_close must be non-negative"));
    }
    if config.get_string("strategy", "lookback_bars").is_some() {
        validate_at_least(config, "strategy", "lookback_bars", 0, 1)?;
    }
    let name = strategy_name(config);
    Strategy::from_name(&name, &StrategyParams::default())?;
    Ok(())
}

/// Configured strategy name, `n_limit_up` when unset.
pub fn strategy_name(config: &dyn ConfigPort) -> String {
    config
        .get_string("strategy", "name")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "n_limit_up".to_string())
}

/// `[snapshot] close_time` as `HH:MM`, 15:05 when unset.
pub fn parse_close_time(config: &dyn ConfigPort) -> Result<NaiveTime, ScreenerError> {
    let raw = config
        .get_string("snapshot", "close_time")
        .unwrap_or_else(|| "15:05".to_string());
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .map_err(|_| invalid("snapshot", "close_time", "expected HH:MM"))
}

fn validate_backend(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    let backend = config
        .get_string("data", "history_backend")
        .unwrap_or_else(|| "csv".to_string());
    let backend = backend.trim().to_lowercase();
    if !HISTORY_BACKENDS.contains(&backend.as_str()) {
        return Err(invalid(
            "data",
            "history_backend",
            &format!("unknown backend '{}', expected csv or sqlite", backend),
        ));
    }
    if backend == "sqlite" && !cfg!(feature = "sqlite") {
        return Err(invalid(
            "data",
            "history_backend",
            "sqlite support not compiled in",
        ));
    }
    Ok(())
}

fn validate_intervals(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    let min = int_value(config, "snapshot", "min_interval_secs", 2)?;
    let max = int_value(config, "snapshot", "max_interval_secs", 60)?;
    if max < min {
        return Err(invalid(
            "snapshot",
            "max_interval_secs",
            "max_interval_secs must not be below min_interval_secs",
        ));
    }
    Ok(())
}

fn validate_volume_multiplier(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    let value = float_value(config, "snapshot", "volume_multiplier", 1.0)?;
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid(
            "snapshot",
            "volume_multiplier",
            "volume_multiplier must be positive",
        ));
    }
    Ok(())
}

fn validate_at_least(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
    min: i64,
) -> Result<(), ScreenerError> {
    let value = int_value(config, section, key, default)?;
    if value < min {
        return Err(invalid(
            section,
            key,
            &format!("{} must be at least {}", key, min),
        ));
    }
    Ok(())
}

/// The raw value parsed as an integer; `default` when unset.
fn int_value(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
) -> Result<i64, ScreenerError> {
    match config.get_string(section, key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| invalid(section, key, &format!("'{}' is not an integer", raw.trim()))),
        None => Ok(default),
    }
}

fn float_value(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, ScreenerError> {
    match config.get_string(section, key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| invalid(section, key, &format!("'{}' is not a number", raw.trim()))),
        None => Ok(default),
    }
}

fn invalid(section: &str, key: &str, reason: &str) -> ScreenerError {
    ScreenerError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
