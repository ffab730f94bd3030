use crate::error::ContextError;
use connectors::{
    error::AdapterError,
    http::{client::ReqwestTransport, transport::HttpTransport},
    sql::{base::adapter::SqlAdapter, postgres::adapter::PgAdapter},
};
use engine_config::settings::PipelineSettings;
use model::{
    execution::mapping::TableMappings,
    transform::inference::{NameHeuristic, TypeInference},
};
use std::{path::Path, sync::Arc};
use tracing::info;

/// Everything a cycle needs, built once at startup and shared by reference.
#[derive(Clone)]
pub struct PipelineContext {
    pub settings: Arc<PipelineSettings>,
    pub mappings: Arc<TableMappings>,
    pub transport: Arc<dyn HttpTransport>,
    pub store: Arc<dyn SqlAdapter>,
    pub inference: Arc<dyn TypeInference>,
}

impl PipelineContext {
    pub fn new(
        settings: PipelineSettings,
        transport: Arc<dyn HttpTransport>,
        store: Arc<dyn SqlAdapter>,
    ) -> Self {
        let mappings = Arc::new(settings.table_mappings());
        PipelineContext {
            settings: Arc::new(settings),
            mappings,
            transport,
            store,
            inference: Arc::new(NameHeuristic),
        }
    }

    /// Swaps the column-name type rules.
    pub fn with_inference(mut self, inference: Arc<dyn TypeInference>) -> Self {
        self.inference = inference;
        self
    }

    /// Production wiring: reqwest for sources, Postgres for the destination.
    pub async fn connect(settings: PipelineSettings) -> Result<Self, ContextError> {
        let transport = ReqwestTransport::new().map_err(AdapterError::from)?;
        let store = PgAdapter::connect(&settings.database_url)
            .await
            .map_err(AdapterError::from)?;

        info!(
            tmp_dir = %settings.tmp_dir.display(),
            tables = settings.tables.len(),
            "Pipeline context ready"
        );
        Ok(Self::new(settings, Arc::new(transport), Arc::new(store)))
    }

    pub fn tmp_dir(&self) -> &Path {
        &self.settings.tmp_dir
    }

    /// Creates the temp directory if missing.
    pub async fn ensure_tmp_dir(&self) -> Result<(), ContextError> {
        let dir = self.tmp_dir();
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|source| ContextError::TempDir {
                path: dir.display().to_string(),
                source,
            })
    }
}
