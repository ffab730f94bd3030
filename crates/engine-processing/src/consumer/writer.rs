use crate::{
    consumer::schema::find_drift,
    error::LoadError,
    retry::classify_db_error,
};
use chrono::{Local, NaiveDateTime};
use connectors::{
    error::DbError,
    sql::base::{
        adapter::SqlAdapter,
        metadata::table::{KeySpec, TableSpec},
    },
};
use engine_core::{
    context::pipeline::PipelineContext,
    retry::{RetryPolicy, always_retry},
};
use model::{
    core::value::Value,
    execution::{
        load::{LoadOptions, LoadResult, WriteMode},
        mapping::{KeyStrategy, SURROGATE_KEY_COLUMN, TableMapping},
    },
    records::dataset::Dataset,
};
use std::{borrow::Cow, collections::HashMap, future::Future, sync::Arc, time::Duration};
use tracing::{debug, error, info, warn};

/// Longest identifier Postgres keeps without truncating.
const MAX_IDENTIFIER_LEN: usize = 63;

/// Writes datasets to their mapped tables.
///
/// Per dataset: check existence, verify the schema (append mode only),
/// migrate on drift, back up when asked, write under a bounded retry and
/// finally compare the stored row count.
#[derive(Clone)]
pub struct PersistenceWriter {
    store: Arc<dyn SqlAdapter>,
    write_retry: RetryPolicy,
    /// Also covers the read-only inspection calls.
    migration_retry: RetryPolicy,
}

impl PersistenceWriter {
    pub fn new(store: Arc<dyn SqlAdapter>) -> Self {
        Self {
            store,
            write_retry: RetryPolicy::fixed(3, Duration::from_secs(5)),
            migration_retry: RetryPolicy::for_database(),
        }
    }

    pub fn from_context(ctx: &PipelineContext) -> Self {
        let load = &ctx.settings.load;
        Self::new(ctx.store.clone())
            .with_write_retry(RetryPolicy::fixed(load.max_attempts as usize, load.retry_delay()))
    }

    pub fn with_write_retry(mut self, policy: RetryPolicy) -> Self {
        self.write_retry = policy;
        self
    }

    pub fn with_migration_retry(mut self, policy: RetryPolicy) -> Self {
        self.migration_retry = policy;
        self
    }

    /// Loads `dataset` into `mapping.table`. Never fails as a whole; the
    /// outcome, including any error, is in the returned result.
    pub async fn load(&self, dataset: &Dataset, mapping: &TableMapping, options: LoadOptions) -> LoadResult {
        let table = mapping.table.as_str();
        let mut result = LoadResult::new(dataset.name(), table);

        info!(dataset = dataset.name(), table, rows = dataset.len(), mode = %options.mode, "Loading dataset");
        match self.try_load(dataset, mapping, options, &mut result).await {
            Ok(()) => {
                result.success = true;
                info!(table, rows = result.rows_written, "Load complete");
                result
            }
            Err(e) => {
                error!(dataset = dataset.name(), table, error = %e, "Load failed");
                result.failed(e)
            }
        }
    }

    async fn try_load(
        &self,
        dataset: &Dataset,
        mapping: &TableMapping,
        options: LoadOptions,
        result: &mut LoadResult,
    ) -> Result<(), LoadError> {
        let table = mapping.table.as_str();
        let (key, dataset) = prepare_keys(dataset, mapping);
        let spec = TableSpec::for_dataset(table, &dataset, key);

        let exists = self.inspect(table, || self.store.table_exists(table)).await?;

        if exists && options.mode == WriteMode::Append && !self.verify_table_structure(&spec).await? {
            result.drift_detected = true;
            info!(table, "Schema mismatch detected, migrating");
            let migrated = self.migrate_table_schema(&spec).await;
            result.migration_succeeded = Some(migrated.is_ok());
            migrated?;
        }

        if exists && options.create_backup {
            result.backup_table = Some(self.create_backup_table(table).await?);
        }

        let existing = if exists && options.mode == WriteMode::Append {
            self.inspect(table, || self.store.count_rows(table)).await?
        } else {
            0
        };

        result.rows_written = self.write(&spec, dataset.rows(), exists, options.mode).await?;
        result.rows_expected = existing + dataset.len() as u64;

        let stored = self.inspect(table, || self.store.count_rows(table)).await?;
        result.rows_verified = Some(stored);
        if stored != result.rows_expected {
            warn!(table, expected = result.rows_expected, stored, "Row count mismatch after write");
        } else {
            debug!(table, rows = stored, "Verified row count");
        }

        Ok(())
    }

    /// True when every dataset column exists in the table with a compatible
    /// type family. A table that does not exist trivially fits.
    pub async fn verify_table_structure(&self, spec: &TableSpec) -> Result<bool, LoadError> {
        let table = spec.name.as_str();
        if !self.inspect(table, || self.store.table_exists(table)).await? {
            info!(table = %spec.name, "Table does not exist and will be created");
            return Ok(true);
        }

        let meta = self.inspect(table, || self.store.table_metadata(table)).await?;
        let drift = find_drift(&meta, &spec.columns);
        for d in &drift {
            warn!(table = %spec.name, drift = %d, "Schema drift");
        }
        Ok(drift.is_empty())
    }

    /// Runs a read-only store call, retrying connection-class failures.
    async fn inspect<T, F, Fut>(&self, table: &str, op: F) -> Result<T, LoadError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, DbError>>,
    {
        self.migration_retry
            .run(&format!("inspect {table}"), op, classify_db_error)
            .await
            .map_err(|e| LoadError::Inspect {
                table: table.to_string(),
                source: e.into_inner(),
            })
    }

    /// Rebuilds `spec.name` with the dataset's shape: create `<table>_new`,
    /// copy the shared columns across, then swap it into place.
    pub async fn migrate_table_schema(&self, spec: &TableSpec) -> Result<(), LoadError> {
        let staging = format!("{}_new", spec.name);

        let outcome = self
            .migration_retry
            .run(
                &format!("migrate {}", spec.name),
                || self.migrate_once(spec, &staging),
                classify_db_error,
            )
            .await;

        match outcome {
            Ok(copied) => {
                info!(table = %spec.name, rows = copied, "Schema migrated");
                Ok(())
            }
            Err(e) => {
                if let Err(cleanup) = self.store.drop_table(&staging).await {
                    warn!(table = %staging, error = %cleanup, "Could not drop staging table");
                }
                Err(LoadError::Migration {
                    table: spec.name.clone(),
                    source: e.into_inner(),
                })
            }
        }
    }

    async fn migrate_once(&self, spec: &TableSpec, staging: &str) -> Result<u64, DbError> {
        self.store.drop_table(staging).await?;
        self.store.create_table(&spec.renamed(staging)).await?;

        let existing = self.store.table_metadata(&spec.name).await?;
        let shared: Vec<_> = spec
            .columns
            .iter()
            .filter(|c| existing.has_column(&c.name))
            .cloned()
            .collect();

        let copied = self.store.copy_columns(&spec.name, staging, &shared).await?;
        self.store.swap_tables(&spec.name, staging).await?;
        Ok(copied)
    }

    /// Full copy of `table` as `<table>_backup_<YYYYmmdd_HHMMSS>`.
    pub async fn create_backup_table(&self, table: &str) -> Result<String, LoadError> {
        let backup = backup_table_name(table, Local::now().naive_local());
        self.store
            .copy_table(table, &backup)
            .await
            .map_err(|source| LoadError::Backup {
                table: table.to_string(),
                source,
            })?;

        info!(table, backup = %backup, "Created backup table");
        Ok(backup)
    }

    async fn write(
        &self,
        spec: &TableSpec,
        rows: &[Vec<Value>],
        exists: bool,
        mode: WriteMode,
    ) -> Result<u64, LoadError> {
        let append = exists && mode == WriteMode::Append;

        self.write_retry
            .run(
                &format!("write {}", spec.name),
                || async move {
                    if append {
                        self.store.insert_rows(&spec.name, &spec.columns, rows).await
                    } else {
                        self.store.replace_rows(spec, rows).await
                    }
                },
                always_retry,
            )
            .await
            .map_err(|e| LoadError::Write {
                table: spec.name.clone(),
                attempts: self.write_retry.max_attempts,
                source: e.into_inner(),
            })
    }
}

/// Chooses the table key and, for natural keys, drops rows with a null key
/// and keeps the last row per key.
fn prepare_keys<'a>(dataset: &'a Dataset, mapping: &TableMapping) -> (KeySpec, Cow<'a, Dataset>) {
    match mapping.key_strategy() {
        KeyStrategy::Surrogate if dataset.has_column(SURROGATE_KEY_COLUMN) => {
            warn!(
                table = %mapping.table,
                column = SURROGATE_KEY_COLUMN,
                "Dataset already has the surrogate key column; creating table without a key"
            );
            (KeySpec::None, Cow::Borrowed(dataset))
        }
        KeyStrategy::Surrogate => (KeySpec::Surrogate, Cow::Borrowed(dataset)),
        KeyStrategy::Natural(keys) => {
            let indices: Option<Vec<usize>> = keys.iter().map(|k| dataset.column_index(k)).collect();
            let Some(indices) = indices else {
                warn!(table = %mapping.table, keys = ?keys, "Key columns missing from dataset; creating table without a key");
                return (KeySpec::None, Cow::Borrowed(dataset));
            };
            (KeySpec::Natural(keys.to_vec()), dedupe_by_key(dataset, &indices, &mapping.table))
        }
    }
}

fn dedupe_by_key<'a>(dataset: &'a Dataset, key: &[usize], table: &str) -> Cow<'a, Dataset> {
    let mut last_by_key: HashMap<Vec<&Value>, usize> = HashMap::with_capacity(dataset.len());
    let mut null_keys = 0usize;

    for (idx, row) in dataset.rows().iter().enumerate() {
        let values: Vec<&Value> = key.iter().map(|&k| &row[k]).collect();
        if values.iter().any(|v| v.is_null()) {
            null_keys += 1;
            continue;
        }
        last_by_key.insert(values, idx);
    }

    if null_keys == 0 && last_by_key.len() == dataset.len() {
        return Cow::Borrowed(dataset);
    }

    let duplicates = dataset.len() - null_keys - last_by_key.len();
    warn!(table, null_keys, duplicates, "Dropping rows with null or repeated keys");

    let mut keep = vec![false; dataset.len()];
    for idx in last_by_key.into_values() {
        keep[idx] = true;
    }

    let mut deduped = dataset.clone();
    let mut position = 0;
    deduped.retain_rows(|_| {
        let kept = keep[position];
        position += 1;
        kept
    });
    Cow::Owned(deduped)
}

/// `<table>_backup_<timestamp>`, with the table part shortened so the whole
/// name stays within the identifier limit.
pub fn backup_table_name(table: &str, at: NaiveDateTime) -> String {
    let suffix = format!("_backup_{}", at.format("%Y%m%d_%H%M%S"));
    let room = MAX_IDENTIFIER_LEN.saturating_sub(suffix.len());
    let prefix: String = table.chars().take(room).collect();
    format!("{prefix}{suffix}")
}
