//! Domain error types.

/// Top-level error type for dailyscreen.
#[derive(Debug, thiserror::Error)]
pub enum ScreenerError {
    #[error("historical dataset unavailable at {path}: {reason}")]
    DatasetUnavailable { path: String, reason: String },

    #[error("schema incomplete: resolved {resolved} canonical fields, need at least {required}")]
    SchemaIncomplete { resolved: usize, required: usize },

    #[error("quote feed error: {reason}")]
    Feed { reason: String },

    #[error("live snapshot unavailable: {reason}")]
    SnapshotUnavailable { reason: String },

    #[error("unknown strategy: {name}")]
    UnknownStrategy { name: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("invalid record for {code}: {reason}")]
    InvalidRecord { code: String, reason: String },

    #[error("run cancelled")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&ScreenerError> for std::process::ExitCode {
    fn from(err: &ScreenerError) -> Self {
        let code: u8 = match err {
            ScreenerError::Io(_) => 1,
            ScreenerError::ConfigParse { .. }
            | ScreenerError::ConfigMissing { .. }
            | ScreenerError::ConfigInvalid { .. } => 2,
            ScreenerError::Database { .. } | ScreenerError::DatabaseQuery { .. } => 3,
            ScreenerError::UnknownStrategy { .. } => 4,
            ScreenerError::DatasetUnavailable { .. }
            | ScreenerError::SchemaIncomplete { .. }
            | ScreenerError::Feed { .. }
            | ScreenerError::SnapshotUnavailable { .. }
            | ScreenerError::InvalidRecord { .. } => 5,
            ScreenerError::Cancelled => 6,
        };
        std::process::ExitCode::from(code)
    }
}
