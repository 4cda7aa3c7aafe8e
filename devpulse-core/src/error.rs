//! Error types for devpulse-core

use thiserror::Error;

/// Main error type for the devpulse-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// A group-by dimension the aggregator does not support
    #[error("invalid group_by columns: {requested:?}. Allowed: {allowed:?}")]
    InvalidGroupingKey {
        requested: Vec<String>,
        allowed: &'static [&'static str],
    },

    /// Unknown period granularity
    #[error("invalid period: {0} (expected day, week, month, quarter or year)")]
    InvalidPeriod(String),

    /// Unknown productivity metric
    #[error("invalid productivity metric: {0} (expected code-lines or commits)")]
    InvalidMetric(String),

    /// A raw row that violates the data model
    #[error("invalid record: {0}")]
    InvalidRecord(String),
}

/// Result type alias for devpulse-core
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_grouping_key_names_allowed_set() {
        let err = Error::InvalidGroupingKey {
            requested: vec!["team".to_string()],
            allowed: &["ide", "language", "model"],
        };
        let msg = err.to_string();
        assert!(msg.contains("team"));
        assert!(msg.contains("\"ide\", \"language\", \"model\""));
    }
}
