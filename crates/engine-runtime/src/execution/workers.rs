use engine_config::settings::SheetSpec;
use engine_processing::{
    consumer::writer::PersistenceWriter,
    error::TransformError,
    producer::SourceClient,
    transform::{
        normalizer::Normalizer,
        sheets::{normalize_csv, normalize_sheet},
    },
};
use futures::{StreamExt, future::join_all, stream};
use model::{
    execution::{
        load::{LoadOptions, LoadResult},
        mapping::TableMappings,
        source::{RetrievalKind, SourceDescriptor},
    },
    pagination::page::FetchResult,
    records::dataset::Dataset,
};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Output of a single fetch worker.
pub enum Fetched {
    Pages {
        source: SourceDescriptor,
        result: FetchResult,
    },
    File {
        source: SourceDescriptor,
        path: Option<PathBuf>,
    },
}

pub async fn fetch(client: &SourceClient, source: SourceDescriptor) -> Fetched {
    match source.kind {
        RetrievalKind::PaginatedApi { .. } => {
            let result = client.fetch_paginated(&source).await;
            Fetched::Pages { source, result }
        }
        RetrievalKind::BulkFile { .. } => {
            let path = client.fetch_bulk_file(&source).await;
            Fetched::File { source, path }
        }
    }
}

/// One blocking worker per sheet. Results come back in sheet order.
pub async fn normalize_sheets(
    path: &Path,
    sheets: &[SheetSpec],
    normalizer: &Normalizer,
) -> Vec<(String, Result<Dataset, TransformError>)> {
    info!(path = %path.display(), sheets = sheets.len(), "Launching sheet workers");

    let handles = sheets.iter().cloned().map(|spec| {
        let path = path.to_path_buf();
        let normalizer = normalizer.clone();
        tokio::task::spawn_blocking(move || {
            let result = normalize_sheet(&path, &spec, &normalizer);
            (spec.name, result)
        })
    });

    join_all(handles)
        .await
        .into_iter()
        .zip(sheets)
        .map(|(joined, spec)| {
            joined.unwrap_or_else(|e| (spec.name.clone(), Err(TransformError::Task(e.to_string()))))
        })
        .collect()
}

pub async fn normalize_csv_file(
    path: &Path,
    dataset: &str,
    normalizer: &Normalizer,
) -> Result<Dataset, TransformError> {
    let path = path.to_path_buf();
    let dataset = dataset.to_string();
    let normalizer = normalizer.clone();
    tokio::task::spawn_blocking(move || normalize_csv(&path, &dataset, &normalizer))
        .await
        .map_err(|e| TransformError::Task(e.to_string()))?
}

/// Loads every mapped dataset, at most `concurrency` at a time.
///
/// Returns the load results and the names of datasets without a mapping.
pub async fn load_datasets(
    writer: &PersistenceWriter,
    datasets: &[Dataset],
    mappings: &TableMappings,
    options: LoadOptions,
    concurrency: usize,
) -> (Vec<LoadResult>, Vec<String>) {
    let mut unmapped = Vec::new();
    let mut jobs = Vec::with_capacity(datasets.len());

    for dataset in datasets {
        match mappings.get(dataset.name()) {
            Some(mapping) => jobs.push((dataset, mapping)),
            None => {
                warn!(dataset = dataset.name(), "No table mapping for dataset; skipping");
                unmapped.push(dataset.name().to_string());
            }
        }
    }

    info!(datasets = jobs.len(), concurrency, "Launching load workers");
    let results = stream::iter(jobs)
        .map(|(dataset, mapping)| writer.load(dataset, mapping, options))
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    (results, unmapped)
}

/// Best-effort removal of downloaded files.
pub async fn remove_files(paths: &[PathBuf]) {
    for path in paths {
        match tokio::fs::remove_file(path).await {
            Ok(()) => info!(path = %path.display(), "Removed temp file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), error = %e, "Could not remove temp file"),
        }
    }
}
