//! Error types for the loading and configuration surface.
//!
//! Scoring itself never fails; these cover reading inputs and settings.

use crate::domain::series::SeriesError;

/// Top-level error type for trendscout.
#[derive(Debug, thiserror::Error)]
pub enum ScoutError {
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

    #[error("failed to read {path}: {reason}")]
    DataRead { path: String, reason: String },

    #[error("invalid series for {code}: {source}")]
    InvalidSeries {
        code: String,
        #[source]
        source: SeriesError,
    },

    #[error("no {timeframe} data for {code}")]
    NoData { code: String, timeframe: String },

    #[error("insufficient data for {code}: have {bars} bars, need {minimum}")]
    InsufficientData {
        code: String,
        bars: usize,
        minimum: usize,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ScoutError {
    pub(crate) fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        ScoutError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&ScoutError> for std::process::ExitCode {
    fn from(err: &ScoutError) -> Self {
        let code: u8 = match err {
            ScoutError::Io(_) | ScoutError::Json(_) => 1,
            ScoutError::ConfigParse { .. }
            | ScoutError::ConfigMissing { .. }
            | ScoutError::ConfigInvalid { .. } => 2,
            ScoutError::DataRead { .. } | ScoutError::InvalidSeries { .. } | ScoutError::NoData { .. } => 3,
            ScoutError::InsufficientData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::process::ExitCode;

    #[test]
    fn messages_name_the_failing_key() {
        let err = ScoutError::invalid("backtest", "fee_rate", "must be in [0, 1)");
        assert_eq!(
            err.to_string(),
            "invalid config value [backtest] fee_rate: must be in [0, 1)"
        );
        let err = ScoutError::InsufficientData {
            code: "2330".into(),
            bars: 12,
            minimum: 20,
        };
        assert_eq!(err.to_string(), "insufficient data for 2330: have 12 bars, need 20");
    }

    #[test]
    fn series_error_is_the_source() {
        let err = ScoutError::InvalidSeries {
            code: "AAPL".into(),
            source: SeriesError::OutOfOrder {
                index: 3,
                date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            },
        };
        let source = std::error::Error::source(&err).unwrap();
        assert!(source.to_string().contains("2024-05-01"));
    }

    #[test]
    fn exit_codes_by_category() {
        let config = ScoutError::ConfigMissing {
            section: "data".into(),
            key: "dir".into(),
        };
        assert_eq!(ExitCode::from(&config), ExitCode::from(2));
        let data = ScoutError::NoData {
            code: "X".into(),
            timeframe: "daily".into(),
        };
        assert_eq!(ExitCode::from(&data), ExitCode::from(3));
        let io = ScoutError::Io(std::io::Error::other("boom"));
        assert_eq!(ExitCode::from(&io), ExitCode::from(1));
    }
}
