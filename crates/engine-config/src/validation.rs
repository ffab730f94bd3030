use crate::{error::ConfigError, settings::PipelineSettings};
use std::collections::HashSet;
use tracing::warn;

/// Startup checks over resolved settings. The first problem found wins.
pub struct SettingsValidator<'a> {
    settings: &'a PipelineSettings,
}

impl<'a> SettingsValidator<'a> {
    pub fn new(settings: &'a PipelineSettings) -> Self {
        Self { settings }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.check_database_url()?;
        self.check_urls()?;
        self.check_sizes()?;
        self.check_sources()?;
        self.check_mappings()?;
        Ok(())
    }

    fn check_database_url(&self) -> Result<(), ConfigError> {
        if self.settings.database_url.trim().is_empty() {
            return Err(ConfigError::MissingDatabaseUrl);
        }
        Ok(())
    }

    fn check_urls(&self) -> Result<(), ConfigError> {
        let s = self.settings;
        if s.projects_url.trim().is_empty() {
            return Err(ConfigError::MissingUrl("projects_url".into()));
        }
        if s.base_url.trim().is_empty() && !s.endpoints.is_empty() {
            return Err(ConfigError::MissingUrl("base_url".into()));
        }
        Ok(())
    }

    fn check_sizes(&self) -> Result<(), ConfigError> {
        let s = self.settings;
        let checks = [
            ("page_size", s.fetch.page_size as u64),
            ("max_retries", s.fetch.max_retries as u64),
            ("page_pool_size", s.page_pool_size as u64),
            ("source_pool_size", s.source_pool_size as u64),
            ("load.concurrent_loads", s.load.concurrent_loads as u64),
            ("load.max_attempts", s.load.max_attempts as u64),
        ];

        for (name, value) in checks {
            if value == 0 {
                return Err(ConfigError::Zero(name.to_string()));
            }
        }

        if s.fetch_interval_secs == 0 {
            warn!("fetch_interval_secs is 0; cycles will run back to back");
        }
        Ok(())
    }

    fn check_sources(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for source in self.settings.sources() {
            if !seen.insert(source.id.clone()) {
                return Err(ConfigError::DuplicateSource(source.id));
            }
        }
        Ok(())
    }

    fn check_mappings(&self) -> Result<(), ConfigError> {
        for mapping in &self.settings.tables {
            if mapping.table.trim().is_empty() {
                return Err(ConfigError::EmptyTableName(mapping.dataset.clone()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Endpoint;
    use model::execution::mapping::TableMapping;

    fn valid() -> PipelineSettings {
        PipelineSettings {
            database_url: "postgres://db/wb".into(),
            ..Default::default()
        }
    }

    #[test]
    fn defaults_with_database_pass() {
        assert!(SettingsValidator::new(&valid()).validate().is_ok());
    }

    #[test]
    fn zero_sizes_are_rejected() {
        let mut settings = valid();
        settings.fetch.page_size = 0;
        assert!(matches!(
            SettingsValidator::new(&settings).validate(),
            Err(ConfigError::Zero(name)) if name == "page_size"
        ));

        let mut settings = valid();
        settings.source_pool_size = 0;
        assert!(SettingsValidator::new(&settings).validate().is_err());
    }

    #[test]
    fn duplicate_source_ids_are_rejected() {
        let mut settings = valid();
        settings
            .endpoints
            .push(Endpoint::new("credit_statements", "DS1", "RS1"));
        assert!(matches!(
            SettingsValidator::new(&settings).validate(),
            Err(ConfigError::DuplicateSource(id)) if id == "credit_statements"
        ));
    }

    #[test]
    fn empty_urls_and_tables_are_rejected() {
        let mut settings = valid();
        settings.projects_url = " ".into();
        assert!(matches!(
            SettingsValidator::new(&settings).validate(),
            Err(ConfigError::MissingUrl(_))
        ));

        let mut settings = valid();
        settings.tables.push(TableMapping::new("extra", "", &[]));
        assert!(matches!(
            SettingsValidator::new(&settings).validate(),
            Err(ConfigError::EmptyTableName(d)) if d == "extra"
        ));
    }
}
