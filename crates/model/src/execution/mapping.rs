use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Column name of the synthesized key for tables without a natural key.
pub const SURROGATE_KEY_COLUMN: &str = "row_id";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyStrategy<'a> {
    Natural(&'a [String]),
    Surrogate,
}

/// Links a dataset name to its destination table and key columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMapping {
    pub dataset: String,
    pub table: String,
    #[serde(default)]
    pub primary_key: Vec<String>,
}

impl TableMapping {
    pub fn new(dataset: &str, table: &str, primary_key: &[&str]) -> Self {
        TableMapping {
            dataset: dataset.to_string(),
            table: table.to_string(),
            primary_key: primary_key.iter().map(|k| k.to_string()).collect(),
        }
    }

    pub fn key_strategy(&self) -> KeyStrategy<'_> {
        if self.primary_key.is_empty() {
            KeyStrategy::Surrogate
        } else {
            KeyStrategy::Natural(&self.primary_key)
        }
    }
}

/// Dataset-name keyed lookup over all configured mappings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableMappings {
    entries: BTreeMap<String, TableMapping>,
}

impl TableMappings {
    pub fn new(mappings: impl IntoIterator<Item = TableMapping>) -> Self {
        let entries = mappings
            .into_iter()
            .map(|m| (m.dataset.clone(), m))
            .collect();
        TableMappings { entries }
    }

    pub fn get(&self, dataset: &str) -> Option<&TableMapping> {
        self.entries.get(dataset)
    }

    pub fn insert(&mut self, mapping: TableMapping) {
        self.entries.insert(mapping.dataset.clone(), mapping);
    }

    pub fn iter(&self) -> impl Iterator<Item = &TableMapping> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn tables(&self) -> Vec<&str> {
        self.entries.values().map(|m| m.table.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_key_means_surrogate() {
        let mapping = TableMapping::new("loan_statements", "wb_loan_statements", &[]);
        assert_eq!(mapping.key_strategy(), KeyStrategy::Surrogate);

        let mapping = TableMapping::new("themes", "wb_project_themes", &["project_id", "level_1"]);
        assert!(matches!(mapping.key_strategy(), KeyStrategy::Natural(k) if k.len() == 2));
    }

    #[test]
    fn lookup_by_dataset_name() {
        let mappings = TableMappings::new([
            TableMapping::new("themes", "wb_project_themes", &[]),
            TableMapping::new("sectors", "wb_project_sectors", &[]),
        ]);
        assert_eq!(mappings.get("sectors").map(|m| m.table.as_str()), Some("wb_project_sectors"));
        assert!(mappings.get("financers").is_none());
    }
}
