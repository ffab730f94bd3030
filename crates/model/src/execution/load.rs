use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// Drop and recreate the destination table on every load.
    #[default]
    Replace,
    /// Keep existing rows; goes through schema verification first.
    Append,
}

impl FromStr for WriteMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "replace" => Ok(WriteMode::Replace),
            "append" => Ok(WriteMode::Append),
            other => Err(format!("unknown write mode '{other}'")),
        }
    }
}

impl fmt::Display for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteMode::Replace => f.write_str("replace"),
            WriteMode::Append => f.write_str("append"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadOptions {
    pub mode: WriteMode,
    pub create_backup: bool,
}

/// Outcome of writing one dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadResult {
    pub dataset: String,
    pub table: String,
    pub success: bool,
    pub rows_written: u64,
    /// Rows the table should hold after the write.
    pub rows_expected: u64,
    pub rows_verified: Option<u64>,
    pub drift_detected: bool,
    /// Only set when drift was detected.
    pub migration_succeeded: Option<bool>,
    pub backup_table: Option<String>,
    pub error: Option<String>,
}

impl LoadResult {
    pub fn new(dataset: &str, table: &str) -> Self {
        LoadResult {
            dataset: dataset.to_string(),
            table: table.to_string(),
            ..Default::default()
        }
    }

    pub fn failed(mut self, error: impl fmt::Display) -> Self {
        self.success = false;
        self.error = Some(error.to_string());
        self
    }

    pub fn count_matches(&self) -> bool {
        self.rows_verified == Some(self.rows_expected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_write_mode() {
        assert_eq!("Append".parse::<WriteMode>(), Ok(WriteMode::Append));
        assert_eq!(" replace ".parse::<WriteMode>(), Ok(WriteMode::Replace));
        assert!("upsert".parse::<WriteMode>().is_err());
    }
}
