use crate::{
    error::PipelineError,
    execution::{
        report::{CycleReport, SourceReport},
        workers::{self, Fetched},
    },
};
use engine_core::context::pipeline::PipelineContext;
use engine_processing::{
    consumer::writer::PersistenceWriter,
    error::TransformError,
    producer::SourceClient,
    transform::{normalizer::Normalizer, pipeline::TransformPipeline},
};
use futures::{StreamExt, stream};
use model::{
    execution::source::{FileFormat, RetrievalKind, SourceDescriptor},
    pagination::page::FetchResult,
    records::dataset::Dataset,
};
use std::path::PathBuf;
use tracing::{error, info, warn};

/// Runs one full cycle: fetch every source, normalize, load, clean up.
pub async fn run_cycle(ctx: &PipelineContext) -> Result<CycleReport, PipelineError> {
    CycleExecutor::new(ctx).execute().await
}

struct CycleExecutor<'a> {
    ctx: &'a PipelineContext,
    normalizer: Normalizer,
    report: CycleReport,
    datasets: Vec<Dataset>,
    downloads: Vec<(SourceDescriptor, PathBuf)>,
}

impl<'a> CycleExecutor<'a> {
    fn new(ctx: &'a PipelineContext) -> Self {
        let report = CycleReport::new();
        let normalizer = Normalizer::new(ctx.inference.clone(), report.started_at.naive_utc());
        Self {
            ctx,
            normalizer,
            report,
            datasets: Vec::new(),
            downloads: Vec::new(),
        }
    }

    async fn execute(mut self) -> Result<CycleReport, PipelineError> {
        info!(cycle_id = %self.report.cycle_id, "Starting cycle");
        self.ctx.ensure_tmp_dir().await?;

        if let Err(e) = self.fetch_all().await {
            self.cleanup().await;
            error!(cycle_id = %self.report.cycle_id, error = %e, "Cycle aborted before any write");
            return Err(e);
        }

        self.normalize_downloads().await;
        self.load_all().await;
        self.cleanup().await;

        self.report.finish();
        let partial: Vec<&str> = self.report.partial_sources().map(|s| s.source.as_str()).collect();
        info!(
            cycle_id = %self.report.cycle_id,
            datasets = self.report.loads.len(),
            failed_loads = self.report.failed_loads().count(),
            rows = self.report.rows_written(),
            partial_sources = ?partial,
            "Cycle complete"
        );
        Ok(self.report)
    }

    /// Bulk downloads and paginated fetches share one bounded pool. API
    /// results are normalized as they arrive.
    async fn fetch_all(&mut self) -> Result<(), PipelineError> {
        let ctx = self.ctx;
        let settings = &ctx.settings;
        let sources = settings.sources();
        let client = SourceClient::from_context(ctx);
        info!(sources = sources.len(), pool = settings.source_pool_size, "Fetching sources");

        let mut unavailable = None;
        let mut fetches = stream::iter(sources)
            .map(|source| workers::fetch(&client, source))
            .buffer_unordered(settings.source_pool_size.max(1));

        while let Some(fetched) = fetches.next().await {
            match fetched {
                Fetched::Pages { source, result } => self.accept_pages(&source, result),
                Fetched::File { source, path } => {
                    self.report.sources.push(SourceReport::file(&source.id, path.is_some()));
                    match path {
                        Some(path) => self.downloads.push((source, path)),
                        None if source.mandatory => {
                            error!(source = %source.id, url = %source.url, "Mandatory source unavailable");
                            if unavailable.is_none() {
                                unavailable = Some(source);
                            }
                        }
                        None => warn!(source = %source.id, "Optional file source unavailable; skipping"),
                    }
                }
            }
        }

        match unavailable {
            Some(source) => Err(PipelineError::SourceUnavailable {
                source_id: source.id,
                url: source.url,
            }),
            None => Ok(()),
        }
    }

    fn accept_pages(&mut self, source: &SourceDescriptor, result: FetchResult) {
        let summary = SourceReport::from_fetch(&source.id, &result);
        if summary.is_partial() {
            warn!(
                source = %source.id,
                declared = result.count,
                received = result.data.len(),
                failed_pages = ?result.failed_pages,
                "Partial fetch result"
            );
        }
        self.report.sources.push(summary);

        if result.is_empty() {
            warn!(source = %source.id, "No records fetched; skipping dataset");
            return;
        }

        let processed_at = self.normalizer.ingested_at();
        let normalized = self
            .normalizer
            .normalize_records(&source.id, &result.data)
            .and_then(|mut dataset| {
                TransformPipeline::for_api_dataset(&source.id, processed_at).apply(&mut dataset)?;
                Ok(dataset)
            });
        self.accept_dataset(&source.id, normalized);
    }

    async fn normalize_downloads(&mut self) {
        let ctx = self.ctx;
        let downloads = std::mem::take(&mut self.downloads);

        for (source, path) in &downloads {
            let RetrievalKind::BulkFile { format, .. } = &source.kind else {
                continue;
            };
            match format {
                FileFormat::Xlsx => {
                    let sheets = &ctx.settings.sheets;
                    let results = workers::normalize_sheets(path, sheets, &self.normalizer).await;
                    for (sheet, result) in results {
                        self.accept_dataset(&sheet, result);
                    }
                }
                FileFormat::Csv => {
                    let result = workers::normalize_csv_file(path, &source.id, &self.normalizer).await;
                    self.accept_dataset(&source.id, result);
                }
            }
        }

        self.downloads = downloads;
    }

    fn accept_dataset(&mut self, label: &str, result: Result<Dataset, TransformError>) {
        match result {
            Ok(dataset) => self.datasets.push(dataset),
            Err(e) => {
                error!(dataset = label, error = %e, "Normalization failed");
                self.report.transform_failures.push((label.to_string(), e.to_string()));
            }
        }
    }

    async fn load_all(&mut self) {
        let ctx = self.ctx;
        let load = &ctx.settings.load;
        let writer = PersistenceWriter::from_context(ctx);
        let (results, unmapped) = workers::load_datasets(
            &writer,
            &self.datasets,
            &ctx.mappings,
            load.options(),
            load.concurrent_loads,
        )
        .await;

        self.report.loads = results;
        self.report.unmapped = unmapped;
    }

    async fn cleanup(&self) {
        let paths: Vec<PathBuf> = self.downloads.iter().map(|(_, p)| p.clone()).collect();
        workers::remove_files(&paths).await;
    }
}
