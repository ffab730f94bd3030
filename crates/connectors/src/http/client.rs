use crate::http::{
    error::SourceError,
    transport::{DOWNLOAD_CHUNK_SIZE, HttpTransport},
};
use async_trait::async_trait;
use futures_util::StreamExt;
use serde_json::Value as JsonValue;
use std::{path::Path, time::Duration};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::debug;

#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("wbetl/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SourceError::from_reqwest("<client>", e))?;
        Ok(ReqwestTransport { client })
    }

    async fn send(&self, url: &str, timeout: Option<Duration>) -> Result<reqwest::Response, SourceError> {
        let mut request = self.client.get(url);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SourceError::from_reqwest(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get_json(&self, url: &str, timeout: Duration) -> Result<JsonValue, SourceError> {
        let response = self.send(url, Some(timeout)).await?;
        response
            .json::<JsonValue>()
            .await
            .map_err(|e| SourceError::from_reqwest(url, e))
    }

    async fn download(&self, url: &str, dest: &Path, timeout: Duration) -> Result<u64, SourceError> {
        let response = tokio::time::timeout(timeout, self.send(url, None))
            .await
            .map_err(|_| SourceError::Timeout {
                url: url.to_string(),
            })??;

        let io_err = |source| SourceError::Io {
            url: url.to_string(),
            source,
        };

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }

        let file = tokio::fs::File::create(dest).await.map_err(io_err)?;
        let mut writer = BufWriter::with_capacity(DOWNLOAD_CHUNK_SIZE, file);
        let mut stream = response.bytes_stream();
        let mut written = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| SourceError::from_reqwest(url, e))?;
            writer.write_all(&chunk).await.map_err(io_err)?;
            written += chunk.len() as u64;
        }

        writer.flush().await.map_err(io_err)?;
        debug!(url, bytes = written, path = %dest.display(), "Download complete");
        Ok(written)
    }
}
