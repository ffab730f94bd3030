use crate::http::error::SourceError;
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::{path::Path, time::Duration};

/// Buffer size used when streaming bulk downloads to disk.
pub const DOWNLOAD_CHUNK_SIZE: usize = 8192;

/// The network seam of the source client.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// GETs `url` and decodes the body as JSON. Non-2xx is an error.
    async fn get_json(&self, url: &str, timeout: Duration) -> Result<JsonValue, SourceError>;

    /// Streams the body of `url` into `dest`, returning the bytes written.
    /// `timeout` bounds the wait for the response headers, not the transfer.
    async fn download(&self, url: &str, dest: &Path, timeout: Duration) -> Result<u64, SourceError>;
}
