use std::path::PathBuf;
use thiserror::Error;

/// Configuration problems. All of them stop the process at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("DATABASE_URL is not set")]
    MissingDatabaseUrl,

    #[error("Missing required URL: {0}")]
    MissingUrl(String),

    #[error("Invalid value for {key}: '{value}' ({reason})")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("{0} must be greater than zero")]
    Zero(String),

    #[error("Duplicate source id: {0}")]
    DuplicateSource(String),

    #[error("Table mapping for dataset '{0}' has an empty table name")]
    EmptyTableName(String),

    #[error("Invalid env file {path} at line {line}: {reason}")]
    EnvFile {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ConfigError {
    pub fn invalid(key: &str, value: &str, reason: impl ToString) -> Self {
        ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}
