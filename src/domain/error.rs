//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for signalframe.
#[derive(Debug, thiserror::Error)]
pub enum SignalframeError {
    #[error("{series}: dates not strictly increasing ({current} follows {previous})")]
    NonMonotonicDates {
        series: String,
        previous: NaiveDate,
        current: NaiveDate,
    },

    #[error("{series}: duplicate record for {date}")]
    DuplicateDate { series: String, date: String },

    #[error("benchmark {symbol} has no rows in the configured range")]
    EmptyBenchmark { symbol: String },

    #[error("column {column} has {actual} rows, canonical index has {expected}")]
    RowCountMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("duplicate column name: {name}")]
    DuplicateColumn { name: String },

    #[error(
        "causality violation in {column} at {date}: full run gave {full}, truncated run gave {truncated}"
    )]
    CausalityViolation {
        column: String,
        date: NaiveDate,
        full: String,
        truncated: String,
    },

    #[error("invalid timestamp {value:?}: {reason}")]
    InvalidTimestamp { value: String, reason: String },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("scorer error: {reason}")]
    Scorer { reason: String },

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

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SignalframeError {
    pub fn config_invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        SignalframeError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub fn config_missing(section: &str, key: &str) -> Self {
        SignalframeError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }
    }

    /// Integrity errors abort the run regardless of how sparse the rest of the data is.
    pub fn is_integrity(&self) -> bool {
        matches!(
            self,
            SignalframeError::NonMonotonicDates { .. }
                | SignalframeError::DuplicateDate { .. }
                | SignalframeError::EmptyBenchmark { .. }
        )
    }
}

impl From<&SignalframeError> for std::process::ExitCode {
    fn from(err: &SignalframeError) -> Self {
        let code: u8 = match err {
            SignalframeError::Io(_) | SignalframeError::Csv(_) => 1,
            SignalframeError::ConfigParse { .. }
            | SignalframeError::ConfigMissing { .. }
            | SignalframeError::ConfigInvalid { .. } => 2,
            SignalframeError::Data { .. }
            | SignalframeError::InvalidTimestamp { .. }
            | SignalframeError::Scorer { .. } => 3,
            SignalframeError::NonMonotonicDates { .. }
            | SignalframeError::DuplicateDate { .. }
            | SignalframeError::EmptyBenchmark { .. } => 4,
            SignalframeError::RowCountMismatch { .. }
            | SignalframeError::DuplicateColumn { .. }
            | SignalframeError::CausalityViolation { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
