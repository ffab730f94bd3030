use super::SourceClient;
use crate::retry::classify_source_error;
use model::execution::source::{RetrievalKind, SourceDescriptor};
use std::path::PathBuf;
use tracing::{error, info, warn};

impl SourceClient {
    /// Streams a bulk source into the download directory.
    ///
    /// Returns `None` once retries are exhausted; a partially written file
    /// is removed first. The caller owns the returned file.
    pub async fn fetch_bulk_file(&self, source: &SourceDescriptor) -> Option<PathBuf> {
        let file_name = match &source.kind {
            RetrievalKind::BulkFile { file_name, .. } => file_name.as_str(),
            RetrievalKind::PaginatedApi { .. } => {
                error!(source = %source.id, "Not a bulk file source");
                return None;
            }
        };

        let dest = self.download_dir.join(file_name);
        let timeout = source.params.timeout();
        let policy = Self::retry_policy(source);

        info!(source = %source.id, url = %source.url, "Downloading file");
        let outcome = policy
            .run(
                &source.id,
                || self.transport.download(&source.url, &dest, timeout),
                classify_source_error,
            )
            .await;

        match outcome {
            Ok(bytes) => {
                info!(source = %source.id, bytes, path = %dest.display(), "Downloaded file");
                Some(dest)
            }
            Err(e) => {
                error!(source = %source.id, error = %e, "Download failed");
                if let Err(rm) = tokio::fs::remove_file(&dest).await
                    && rm.kind() != std::io::ErrorKind::NotFound
                {
                    warn!(path = %dest.display(), error = %rm, "Could not remove partial download");
                }
                None
            }
        }
    }
}
