//! CLI definition and dispatch.

use chrono::{Local, NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing::{info, warn};

use crate::adapters::csv_adapter::{
    CsvHistoryAdapter, CsvInstrumentAdapter, CsvQuoteFeed, CsvSnapshotCache,
};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::report::{tables, CsvReportAdapter};
use crate::domain::cancel::CancellationToken;
use crate::domain::config_validation::{
    parse_close_time, strategy_name, validate_config, validate_data_config,
};
use crate::domain::engine::{SelectionEngine, SelectionRow};
use crate::domain::error::ScreenerError;
use crate::domain::history::{summarize, validate_history};
use crate::domain::schema::normalize_code;
use crate::domain::snapshot::{trading_date, RetryPolicy, SnapshotProvider, SnapshotSettings};
use crate::domain::strategy::{Strategy, StrategyParams};
use crate::domain::window::Lookback;
use crate::ports::config_port::ConfigPort;
use crate::ports::history_port::HistoryPort;
use crate::ports::instrument_port::InstrumentPort;
use crate::ports::quote_port::{QuoteFeedPort, SnapshotCachePort};
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "dailyscreen", about = "End-of-day A-share stock screener")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one strategy over every instrument
    Select {
        #[arg(short, long)]
        config: PathBuf,
        /// Strategy name, overriding [strategy] name
        #[arg(short, long)]
        strategy: Option<String>,
        /// Consecutive limit-up days for n_limit_up
        #[arg(long)]
        days: Option<usize>,
        /// Also write results as CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Ignore the snapshot cache and poll the feed
        #[arg(long)]
        force_refresh: bool,
        /// Evaluate as of this date instead of the current trading day
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// List the registered strategies
    Strategies,
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show bar counts and date ranges of the historical dataset
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        code: Option<String>,
    },
    /// Load a CSV history into an SQLite store
    #[cfg(feature = "sqlite")]
    Import {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        database: PathBuf,
    },
}

/// Per-run options from the command line.
#[derive(Debug, Clone, Default)]
pub struct SelectOptions {
    pub strategy: Option<String>,
    pub days: Option<usize>,
    pub output: Option<PathBuf>,
    pub force_refresh: bool,
    pub date: Option<NaiveDate>,
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Select {
            config,
            strategy,
            days,
            output,
            force_refresh,
            date,
        } => run_select(
            &config,
            &SelectOptions {
                strategy,
                days,
                output,
                force_refresh,
                date,
            },
        ),
        Command::Strategies => {
            print!("{}", render_strategies());
            Ok(())
        }
        Command::Validate { config } => run_validate(&config),
        Command::Info { config, code } => run_info(&config, code.as_deref()),
        #[cfg(feature = "sqlite")]
        Command::Import { input, database } => run_import(&input, &database),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ScreenerError> {
    info!(path = %path.display(), "loading config");
    FileConfigAdapter::from_file(path)
}

pub fn run_select(config_path: &Path, options: &SelectOptions) -> Result<(), ScreenerError> {
    let config = load_config(config_path)?;
    validate_config(&config)?;

    let strategy = build_strategy(&config, options)?;
    let lookback = resolve_lookback(&config, &strategy);
    let settings = build_snapshot_settings(&config)?;

    let history = build_history_port(&config)?;
    let feed = CsvQuoteFeed::new(PathBuf::from(config.require_string("snapshot", "feed_path")?));
    let cache = CsvSnapshotCache::new(config_path_or(
        &config,
        "snapshot",
        "cache_path",
        "snapshot_cache.csv",
    ));
    let instruments =
        CsvInstrumentAdapter::new(config_path_or(&config, "data", "stock_pool", "stock_pool.csv"));

    let now = Local::now().naive_local();
    let request = SelectionRequest {
        strategy,
        lookback,
        now,
        today: options.date.unwrap_or_else(|| trading_date(now)),
        force_refresh: options.force_refresh,
    };
    let pipeline = SelectionPipeline {
        history: history.as_ref(),
        feed: &feed,
        cache: &cache,
        instruments: &instruments,
        snapshot: settings,
    };
    let rows = pipeline.run(&request, &CancellationToken::new())?;

    let with_metrics = config.get_bool("output", "show_metrics", true);
    print!(
        "{}",
        tables::render_table(&rows, request.strategy.name(), with_metrics)
    );

    let output = options
        .output
        .clone()
        .or_else(|| config.get_string("output", "path").map(PathBuf::from));
    if let Some(path) = output {
        CsvReportAdapter::new(with_metrics).write(&rows, &request.strategy, &path)?;
    }
    Ok(())
}

/// Everything one selection run varies on.
#[derive(Debug, Clone)]
pub struct SelectionRequest {
    pub strategy: Strategy,
    pub lookback: Lookback,
    /// Wall-clock time, for cache freshness and the snapshot's trading date.
    pub now: NaiveDateTime,
    /// The date today's bar is evaluated as.
    pub today: NaiveDate,
    pub force_refresh: bool,
}

/// The ports one selection run reads from.
pub struct SelectionPipeline<'a> {
    pub history: &'a dyn HistoryPort,
    pub feed: &'a dyn QuoteFeedPort,
    pub cache: &'a dyn SnapshotCachePort,
    pub instruments: &'a dyn InstrumentPort,
    pub snapshot: SnapshotSettings,
}

impl SelectionPipeline<'_> {
    /// Loads history, fetches the snapshot, then screens every instrument.
    ///
    /// A missing dataset fails the run before the feed is touched.
    pub fn run(
        &self,
        request: &SelectionRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<SelectionRow>, ScreenerError> {
        let raw = self.history.load_raw()?;
        let history = validate_history(&raw, &self.history.source())?;
        cancel.check()?;

        let provider = SnapshotProvider::new(self.feed, self.cache, self.snapshot.clone());
        let snapshot = provider.snapshot(request.now, request.force_refresh, cancel)?;

        let names = match self.instruments.load_names() {
            Ok(names) => names,
            Err(e) => {
                warn!(error = %e, "instrument names unavailable");
                Default::default()
            }
        };

        SelectionEngine::new(&request.strategy, request.lookback, request.today, &names)
            .run(&history, &snapshot, cancel)
    }
}

pub fn build_strategy(
    config: &dyn ConfigPort,
    options: &SelectOptions,
) -> Result<Strategy, ScreenerError> {
    let consecutive_days = match options.days {
        Some(0) => {
            return Err(ScreenerError::ConfigInvalid {
                section: "strategy".into(),
                key: "consecutive_days".into(),
                reason: "--days must be at least 1".into(),
            });
        }
        Some(days) => days,
        None => config.get_int("strategy", "consecutive_days", 1).max(1) as usize,
    };
    let params = StrategyParams {
        consecutive_days,
        min_close: config.get_double("strategy", "min_close", StrategyParams::default().min_close),
    };
    let name = options
        .strategy
        .clone()
        .unwrap_or_else(|| strategy_name(config));
    let strategy = Strategy::from_name(&name, &params)?;
    info!(strategy = strategy.name(), "strategy resolved");
    Ok(strategy)
}

/// `[strategy] lookback_bars` when set, else the strategy's own window.
pub fn resolve_lookback(config: &dyn ConfigPort, strategy: &Strategy) -> Lookback {
    match config.get_int("strategy", "lookback_bars", 0) {
        n if n > 0 => Lookback::Bars(n as usize),
        _ => strategy.lookback(),
    }
}

pub fn build_snapshot_settings(config: &dyn ConfigPort) -> Result<SnapshotSettings, ScreenerError> {
    let secs = |key: &str, default: i64| {
        Duration::from_secs(config.get_int("snapshot", key, default).max(0) as u64)
    };
    Ok(SnapshotSettings {
        retry: RetryPolicy {
            max_attempts: config.get_int("snapshot", "max_retries", 3).max(1) as u32,
            min_interval: secs("min_interval_secs", 2),
            max_interval: secs("max_interval_secs", 60),
        },
        open_ttl: chrono::Duration::minutes(config.get_int("snapshot", "open_ttl_minutes", 2)),
        closed_ttl: chrono::Duration::minutes(
            config.get_int("snapshot", "closed_ttl_minutes", 720),
        ),
        close_time: parse_close_time(config)?,
        volume_multiplier: config.get_double("snapshot", "volume_multiplier", 1.0),
    })
}

pub fn build_history_port(config: &dyn ConfigPort) -> Result<Box<dyn HistoryPort>, ScreenerError> {
    let path = config.require_string("data", "history_path")?;
    let backend = config
        .get_string("data", "history_backend")
        .map(|b| b.trim().to_lowercase())
        .unwrap_or_else(|| "csv".to_string());
    match backend.as_str() {
        #[cfg(feature = "sqlite")]
        "sqlite" => {
            use crate::adapters::sqlite_adapter::SqliteHistoryAdapter;
            Ok(Box::new(SqliteHistoryAdapter::from_config(config)?))
        }
        "csv" => Ok(Box::new(CsvHistoryAdapter::new(PathBuf::from(path)))),
        other => Err(ScreenerError::ConfigInvalid {
            section: "data".into(),
            key: "history_backend".into(),
            reason: format!("unsupported backend '{}'", other),
        }),
    }
}

fn config_path_or(config: &dyn ConfigPort, section: &str, key: &str, default: &str) -> PathBuf {
    config
        .get_string(section, key)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(default))
}

pub fn render_strategies() -> String {
    let registry = Strategy::registry();
    let width = registry.iter().map(|s| s.name().len()).max().unwrap_or(0);
    registry
        .iter()
        .map(|s| {
            format!(
                "{:<width$}  {:<14}  {}\n",
                s.name(),
                s.lookback().to_string(),
                s.description(),
                width = width
            )
        })
        .collect()
}

pub fn run_validate(config_path: &Path) -> Result<(), ScreenerError> {
    let config = load_config(config_path)?;
    validate_config(&config)?;
    let strategy = build_strategy(&config, &SelectOptions::default())?;
    println!("{}: configuration is valid", config_path.display());
    println!(
        "strategy: {} ({})",
        strategy.name(),
        resolve_lookback(&config, &strategy)
    );
    Ok(())
}

pub fn run_info(config_path: &Path, code: Option<&str>) -> Result<(), ScreenerError> {
    let config = load_config(config_path)?;
    validate_data_config(&config)?;
    let port = build_history_port(&config)?;
    let history = validate_history(&port.load_raw()?, &port.source())?;
    let summaries = summarize(&history);

    match code.map(normalize_code) {
        Some(code) => match summaries.iter().find(|s| s.code == code) {
            Some(s) => println!("{}: {} bars, {} to {}", s.code, s.bars, s.first, s.last),
            None => println!("{}: no data found", code),
        },
        None => {
            let bars: usize = summaries.iter().map(|s| s.bars).sum();
            println!("{}: {} instruments, {} bars", port.source(), summaries.len(), bars);
            for s in &summaries {
                println!("  {}: {} bars, {} to {}", s.code, s.bars, s.first, s.last);
            }
        }
    }
    Ok(())
}

#[cfg(feature = "sqlite")]
pub fn run_import(input: &Path, database: &Path) -> Result<(), ScreenerError> {
    use crate::adapters::sqlite_adapter::SqliteHistoryAdapter;
    use crate::domain::bar::Bar;

    let source = CsvHistoryAdapter::new(input.to_path_buf());
    let history = validate_history(&source.load_raw()?, &source.source())?;
    let mut bars = Vec::with_capacity(history.len());
    for row in 0..history.len() {
        match Bar::from_row(&history, row, None) {
            Ok(bar) => bars.push(bar),
            Err(e) => warn!(row, error = %e, "skipping row"),
        }
    }
    let stored = SqliteHistoryAdapter::create(database, 1)?.insert_bars(&bars)?;
    println!("imported {} bars into {}", stored, database.display());
    Ok(())
}
