use crate::{
    defaults,
    env::{EnvManager, redact_connection_string},
    error::ConfigError,
    validation::SettingsValidator,
};
use model::{
    core::identifiers::standardize_column_name,
    execution::{
        load::{LoadOptions, WriteMode},
        mapping::{TableMapping, TableMappings},
        source::{FetchParams, FileFormat, SourceDescriptor},
    },
};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::{debug, info};

pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_FETCH_INTERVAL: &str = "FETCH_INTERVAL";
pub const ENV_SOURCE_POOL_SIZE: &str = "SOURCE_POOL_SIZE";
pub const ENV_PAGE_POOL_SIZE: &str = "PAGE_POOL_SIZE";
pub const ENV_LOG_LEVEL: &str = "WBETL_LOG_LEVEL";
pub const ENV_TMP_DIR: &str = "WBETL_TMP_DIR";
pub const ENV_CREATE_BACKUP: &str = "WBETL_CREATE_BACKUP";
pub const ENV_WRITE_MODE: &str = "WBETL_WRITE_MODE";
pub const ENV_CONCURRENT_LOADS: &str = "WBETL_CONCURRENT_LOADS";
pub const ENV_GEF_PROJECTS_URL: &str = "GEF_PROJECTS_URL";

/// A paginated catalog endpoint; `name` doubles as source id and dataset name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub name: String,
    pub dataset_id: String,
    pub resource_id: String,
}

impl Endpoint {
    pub fn new(name: &str, dataset_id: &str, resource_id: &str) -> Self {
        Endpoint {
            name: name.to_string(),
            dataset_id: dataset_id.to_string(),
            resource_id: resource_id.to_string(),
        }
    }
}

/// One worksheet of the projects export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetSpec {
    pub name: String,
    /// Zero-based absolute row indices dropped before the header is read.
    #[serde(default)]
    pub skip_rows: Vec<u32>,
    /// Copy hyperlink targets of project id cells into `<column>_url`.
    #[serde(default)]
    pub extract_links: bool,
}

impl SheetSpec {
    pub fn new(name: &str, skip_rows: &[u32]) -> Self {
        SheetSpec {
            name: name.to_string(),
            skip_rows: skip_rows.to_vec(),
            extract_links: false,
        }
    }

    pub fn with_links(mut self) -> Self {
        self.extract_links = true;
        self
    }

    pub fn dataset_name(&self) -> String {
        standardize_column_name(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadSettings {
    pub mode: WriteMode,
    pub create_backup: bool,
    /// Datasets written at the same time; 1 keeps loads sequential.
    pub concurrent_loads: usize,
    pub max_attempts: u32,
    pub retry_delay_secs: u64,
}

impl Default for LoadSettings {
    fn default() -> Self {
        LoadSettings {
            mode: WriteMode::Replace,
            create_backup: false,
            concurrent_loads: defaults::CONCURRENT_LOADS,
            max_attempts: defaults::LOAD_MAX_ATTEMPTS,
            retry_delay_secs: defaults::LOAD_RETRY_DELAY_SECS,
        }
    }
}

impl LoadSettings {
    pub fn options(&self) -> LoadOptions {
        LoadOptions {
            mode: self.mode,
            create_backup: self.create_backup,
        }
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

/// Process-wide configuration, fixed at startup.
///
/// Resolution order: built-in defaults, then the optional JSON file (omitted
/// fields keep their defaults), then environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub database_url: String,
    pub projects_url: String,
    pub projects_file_name: String,
    pub base_url: String,
    pub endpoints: Vec<Endpoint>,
    pub fetch: FetchParams,
    /// Pause after each page request, per page worker.
    pub page_pause_ms: u64,
    pub page_pool_size: usize,
    pub source_pool_size: usize,
    pub fetch_interval_secs: u64,
    pub sheets: Vec<SheetSpec>,
    pub tables: Vec<TableMapping>,
    pub load: LoadSettings,
    pub gef_projects_url: Option<String>,
    pub tmp_dir: PathBuf,
    pub log_level: String,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        PipelineSettings {
            database_url: String::new(),
            projects_url: defaults::PROJECTS_URL.to_string(),
            projects_file_name: defaults::PROJECTS_FILE_NAME.to_string(),
            base_url: defaults::BASE_URL.to_string(),
            endpoints: defaults::endpoints(),
            fetch: FetchParams::default(),
            page_pause_ms: defaults::PAGE_PAUSE_MS,
            page_pool_size: defaults::POOL_SIZE,
            source_pool_size: defaults::POOL_SIZE,
            fetch_interval_secs: defaults::FETCH_INTERVAL_SECS,
            sheets: defaults::sheets(),
            tables: defaults::table_mappings(),
            load: LoadSettings::default(),
            gef_projects_url: None,
            tmp_dir: defaults::tmp_dir(),
            log_level: defaults::LOG_LEVEL.to_string(),
        }
    }
}

impl PipelineSettings {
    /// Defaults, then `config_path` if given, then `env`; validated.
    pub fn load(config_path: Option<&Path>, env: &EnvManager) -> Result<Self, ConfigError> {
        let mut settings = match config_path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        settings.apply_env(env)?;
        SettingsValidator::new(&settings).validate()?;

        info!(
            sources = settings.sources().len(),
            tables = settings.tables.len(),
            interval_secs = settings.fetch_interval_secs,
            "Configuration loaded"
        );
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "Reading config file");
        Ok(serde_json::from_str(&content)?)
    }

    pub fn apply_env(&mut self, env: &EnvManager) -> Result<(), ConfigError> {
        if let Some(url) = env.get(ENV_DATABASE_URL) {
            self.database_url = url.to_string();
        }
        if let Some(secs) = env.get_parsed(ENV_FETCH_INTERVAL)? {
            self.fetch_interval_secs = secs;
        }
        if let Some(size) = env.get_parsed(ENV_SOURCE_POOL_SIZE)? {
            self.source_pool_size = size;
        }
        if let Some(size) = env.get_parsed(ENV_PAGE_POOL_SIZE)? {
            self.page_pool_size = size;
        }
        if let Some(level) = env.get(ENV_LOG_LEVEL) {
            self.log_level = level.to_string();
        }
        if let Some(dir) = env.get(ENV_TMP_DIR) {
            self.tmp_dir = PathBuf::from(dir);
        }
        if let Some(backup) = env.get_bool(ENV_CREATE_BACKUP)? {
            self.load.create_backup = backup;
        }
        if let Some(mode) = env.get_parsed::<WriteMode>(ENV_WRITE_MODE)? {
            self.load.mode = mode;
        }
        if let Some(n) = env.get_parsed(ENV_CONCURRENT_LOADS)? {
            self.load.concurrent_loads = n;
        }
        if let Some(url) = env.get(ENV_GEF_PROJECTS_URL) {
            self.gef_projects_url = Some(url.to_string());
        }
        Ok(())
    }

    /// The spreadsheet export first, then the catalog endpoints, then the
    /// optional CSV feed.
    pub fn sources(&self) -> Vec<SourceDescriptor> {
        let mut sources = Vec::with_capacity(self.endpoints.len() + 2);
        sources.push(self.projects_source());

        sources.extend(self.endpoints.iter().map(|e| {
            SourceDescriptor::paginated(
                &e.name,
                &self.base_url,
                &e.dataset_id,
                &e.resource_id,
                self.fetch.clone(),
            )
        }));

        if let Some(url) = &self.gef_projects_url {
            sources.push(SourceDescriptor::bulk(
                defaults::GEF_SOURCE_ID,
                url,
                defaults::GEF_FILE_NAME,
                FileFormat::Csv,
                self.fetch.clone(),
            ));
        }

        sources
    }

    pub fn projects_source(&self) -> SourceDescriptor {
        SourceDescriptor::bulk(
            defaults::PROJECTS_SOURCE_ID,
            &self.projects_url,
            &self.projects_file_name,
            FileFormat::Xlsx,
            self.fetch.clone(),
        )
        .mandatory()
    }

    pub fn table_mappings(&self) -> TableMappings {
        TableMappings::new(self.tables.iter().cloned())
    }

    pub fn page_pause(&self) -> Duration {
        Duration::from_millis(self.page_pause_ms)
    }

    pub fn fetch_interval(&self) -> Duration {
        Duration::from_secs(self.fetch_interval_secs)
    }

    /// Copy safe to print or log.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        copy.database_url = redact_connection_string(&self.database_url);
        copy
    }
}
