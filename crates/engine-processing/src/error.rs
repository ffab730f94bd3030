use connectors::error::{DbError, FileError};
use model::error::DatasetError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransformError {
    #[error("Invalid dataset '{dataset}': {source}")]
    Dataset {
        dataset: String,
        #[source]
        source: DatasetError,
    },

    #[error("Failed to read '{sheet}': {source}")]
    Sheet {
        sheet: String,
        #[source]
        source: FileError,
    },

    #[error("Failed to read file: {0}")]
    File(#[from] FileError),

    #[error("Transform task failed: {0}")]
    Task(String),
}

impl TransformError {
    pub fn dataset(name: &str, source: DatasetError) -> Self {
        TransformError::Dataset {
            dataset: name.to_string(),
            source,
        }
    }
}

/// Failure of one writer step. Each variant aborts only its own dataset.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to inspect table '{table}': {source}")]
    Inspect {
        table: String,
        #[source]
        source: DbError,
    },

    #[error("Schema migration of '{table}' failed: {source}")]
    Migration {
        table: String,
        #[source]
        source: DbError,
    },

    #[error("Backup of '{table}' failed: {source}")]
    Backup {
        table: String,
        #[source]
        source: DbError,
    },

    #[error("Writing '{table}' failed after {attempts} attempt(s): {source}")]
    Write {
        table: String,
        attempts: usize,
        #[source]
        source: DbError,
    },
}
