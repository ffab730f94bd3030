use crate::error::PipelineError;
use connectors::sql::base::adapter::SqlAdapter;
use model::execution::mapping::TableMappings;
use serde::Serialize;
use tracing::info;

/// Presence and size of one mapped table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableStatus {
    pub dataset: String,
    pub table: String,
    pub exists: bool,
    pub rows: Option<u64>,
}

/// Looks up every mapped table in the destination.
pub async fn table_status(store: &dyn SqlAdapter, mappings: &TableMappings) -> Result<Vec<TableStatus>, PipelineError> {
    let mut statuses = Vec::with_capacity(mappings.len());

    for mapping in mappings.iter() {
        let exists = store.table_exists(&mapping.table).await?;
        let rows = if exists {
            Some(store.count_rows(&mapping.table).await?)
        } else {
            None
        };
        statuses.push(TableStatus {
            dataset: mapping.dataset.clone(),
            table: mapping.table.clone(),
            exists,
            rows,
        });
    }

    let ready = statuses.iter().filter(|s| s.exists).count();
    info!(ready, total = statuses.len(), "Checked mapped tables");
    Ok(statuses)
}
