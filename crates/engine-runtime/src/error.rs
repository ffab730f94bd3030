use connectors::error::DbError;
use engine_core::error::ContextError;
use thiserror::Error;

/// Errors that stop a cycle, or a command, before it gets going.
///
/// Failures of single sources, transforms and loads never surface here;
/// they are logged and recorded in the cycle report instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A mandatory source could not be fetched, so nothing is written.
    #[error("Mandatory source '{source_id}' unavailable at {url}")]
    SourceUnavailable { source_id: String, url: String },

    #[error("Context error: {0}")]
    Context(#[from] ContextError),

    /// Db error.
    #[error("Database error: {0}")]
    Database(#[from] DbError),
}
