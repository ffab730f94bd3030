use crate::sql::base::{
    error::{ConnectorError, DbError},
    metadata::table::{TableMetadata, TableSpec},
};
use async_trait::async_trait;
use model::{core::value::Value, records::dataset::ColumnDef};

/// Table-level operations the persistence writer needs from a store.
///
/// Every method is one statement sequence against one table (or one
/// table pair for copies and swaps); nothing spans tables otherwise.
#[async_trait]
pub trait SqlAdapter: Send + Sync {
    async fn connect(url: &str) -> Result<Self, ConnectorError>
    where
        Self: Sized;

    async fn ping(&self) -> Result<(), DbError>;

    // Introspection
    async fn table_exists(&self, table: &str) -> Result<bool, DbError>;
    async fn list_tables(&self) -> Result<Vec<String>, DbError>;
    async fn table_metadata(&self, table: &str) -> Result<TableMetadata, DbError>;
    async fn count_rows(&self, table: &str) -> Result<u64, DbError>;

    // DDL
    async fn create_table(&self, spec: &TableSpec) -> Result<(), DbError>;
    async fn drop_table(&self, table: &str) -> Result<(), DbError>;

    /// Creates `target` as a full copy of `source`.
    async fn copy_table(&self, source: &str, target: &str) -> Result<(), DbError>;

    /// Copies the listed columns of every row of `source` into `target`.
    async fn copy_columns(&self, source: &str, target: &str, columns: &[ColumnDef]) -> Result<u64, DbError>;

    /// Atomically puts `replacement` in place of `table`; the previous
    /// `table` is renamed aside and dropped.
    async fn swap_tables(&self, table: &str, replacement: &str) -> Result<(), DbError>;

    // Data
    /// Drops and recreates `spec.name`, then inserts `rows`, in one transaction.
    async fn replace_rows(&self, spec: &TableSpec, rows: &[Vec<Value>]) -> Result<u64, DbError>;

    /// Inserts `rows` into an existing table in one transaction.
    async fn insert_rows(&self, table: &str, columns: &[ColumnDef], rows: &[Vec<Value>]) -> Result<u64, DbError>;
}
