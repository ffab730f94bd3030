use connectors::error::AdapterError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContextError {
    #[error("Failed to initialize pipeline context: {0}")]
    Adapter(#[from] AdapterError),

    #[error("Failed to prepare temp directory {path}: {source}")]
    TempDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
