pub use crate::{
    file::error::FileError,
    http::error::SourceError,
    sql::base::error::{ConnectorError, DbError},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    /// Failed to initialize a data connector/adapter.
    #[error("Connector error: {0}")]
    Connector(#[from] ConnectorError),

    /// File-related error.
    #[error("File error: {0}")]
    FileError(#[from] FileError),

    /// Remote source error.
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Database-related error.
    #[error("Database error: {0}")]
    Database(#[from] DbError),
}
