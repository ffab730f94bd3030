use connectors::http::transport::HttpTransport;
use engine_core::{context::pipeline::PipelineContext, retry::RetryPolicy};
use model::execution::source::SourceDescriptor;
use std::{path::PathBuf, sync::Arc, time::Duration};

pub mod bulk;
pub mod paginated;

/// Fetch side of a cycle: paginated JSON sources and bulk file downloads.
///
/// Neither entry point returns an error. Failures degrade to an empty or
/// partial result and a log line.
#[derive(Clone)]
pub struct SourceClient {
    transport: Arc<dyn HttpTransport>,
    page_pool: usize,
    page_pause: Duration,
    download_dir: PathBuf,
}

impl SourceClient {
    pub fn new(transport: Arc<dyn HttpTransport>, download_dir: PathBuf) -> Self {
        Self {
            transport,
            page_pool: 1,
            page_pause: Duration::ZERO,
            download_dir,
        }
    }

    pub fn from_context(ctx: &PipelineContext) -> Self {
        Self::new(ctx.transport.clone(), ctx.tmp_dir().to_path_buf())
            .with_page_pool(ctx.settings.page_pool_size)
            .with_page_pause(ctx.settings.page_pause())
    }

    /// Upper bound on concurrent page requests within one source.
    pub fn with_page_pool(mut self, size: usize) -> Self {
        self.page_pool = size.max(1);
        self
    }

    /// Pause after each page request, per worker.
    pub fn with_page_pause(mut self, pause: Duration) -> Self {
        self.page_pause = pause;
        self
    }

    fn retry_policy(source: &SourceDescriptor) -> RetryPolicy {
        RetryPolicy::fixed(
            source.params.max_retries as usize,
            source.params.retry_delay(),
        )
    }
}
