use crate::sql::base::metadata::column::ColumnMetadata;
use model::{
    core::data_type::DataType,
    execution::mapping::SURROGATE_KEY_COLUMN,
    records::dataset::{ColumnDef, Dataset},
};
use serde::{Deserialize, Serialize};

/// Existing table as read from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMetadata {
    pub name: String,
    /// Sorted by ordinal position.
    pub columns: Vec<ColumnMetadata>,
}

impl TableMetadata {
    pub fn new(name: &str, mut columns: Vec<ColumnMetadata>) -> Self {
        columns.sort_by_key(|c| c.ordinal);
        TableMetadata {
            name: name.to_string(),
            columns,
        }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnMetadata> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeySpec {
    /// No key constraint at all.
    None,
    /// A generated `row_id` column is prepended as the primary key.
    Surrogate,
    Natural(Vec<String>),
}

/// Shape of a table to be created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSpec {
    pub name: String,
    pub columns: Vec<ColumnDef>,
    pub key: KeySpec,
}

impl TableSpec {
    pub fn new(name: &str, columns: Vec<ColumnDef>, key: KeySpec) -> Self {
        TableSpec {
            name: name.to_string(),
            columns,
            key,
        }
    }

    pub fn for_dataset(name: &str, dataset: &Dataset, key: KeySpec) -> Self {
        TableSpec::new(name, dataset.columns().to_vec(), key)
    }

    /// Same shape under a different table name.
    pub fn renamed(&self, name: &str) -> Self {
        TableSpec {
            name: name.to_string(),
            ..self.clone()
        }
    }

    /// Columns the store will report once created, generated key included.
    pub fn stored_columns(&self) -> Vec<ColumnMetadata> {
        let mut columns = Vec::with_capacity(self.columns.len() + 1);
        if self.key == KeySpec::Surrogate {
            columns.push(ColumnMetadata::from_data_type(SURROGATE_KEY_COLUMN, DataType::Int, 1));
        }
        let offset = columns.len();
        columns.extend(
            self.columns
                .iter()
                .enumerate()
                .map(|(i, c)| ColumnMetadata::from_data_type(&c.name, c.data_type, offset + i + 1)),
        );
        columns
    }
}
