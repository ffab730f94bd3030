use model::core::data_type::{DataType, TypeFamily};
use serde::{Deserialize, Serialize};

pub const COL_COLUMN_NAME: &str = "column_name";
pub const COL_DATA_TYPE: &str = "data_type";
pub const COL_IS_NULLABLE: &str = "is_nullable";
pub const COL_ORDINAL_POSITION: &str = "ordinal_position";

/// A column as it exists in storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMetadata {
    pub name: String,
    /// Storage type name as reported by the catalog.
    pub db_type: String,
    pub family: TypeFamily,
    pub ordinal: usize,
    pub is_nullable: bool,
}

impl ColumnMetadata {
    pub fn new(name: &str, db_type: &str, ordinal: usize, is_nullable: bool) -> Self {
        ColumnMetadata {
            name: name.to_string(),
            db_type: db_type.to_string(),
            family: TypeFamily::from_postgres_type(db_type),
            ordinal,
            is_nullable,
        }
    }

    /// Metadata a store would report after creating a column of `data_type`.
    pub fn from_data_type(name: &str, data_type: DataType, ordinal: usize) -> Self {
        ColumnMetadata {
            name: name.to_string(),
            db_type: data_type.postgres_name().to_lowercase(),
            family: data_type.family(),
            ordinal,
            is_nullable: true,
        }
    }
}
