use crate::sql::{
    base::{
        adapter::SqlAdapter,
        error::{ConnectorError, DbError},
        metadata::{
            column::{COL_COLUMN_NAME, COL_DATA_TYPE, COL_IS_NULLABLE, COL_ORDINAL_POSITION, ColumnMetadata},
            table::{TableMetadata, TableSpec},
        },
        query::{
            dialect::{self, Dialect},
            generator::QueryGenerator,
        },
    },
    postgres::{params::PgParamStore, utils::connect_client},
};
use async_trait::async_trait;
use model::{core::value::Value, records::dataset::ColumnDef};
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio_postgres::{Client, Transaction};
use tracing::{debug, warn};

/// Postgres store over one shared client, reopened when the server or the
/// network has closed it.
#[derive(Clone)]
pub struct PgAdapter {
    url: Arc<str>,
    client: Arc<RwLock<Client>>,
    dialect: dialect::Postgres,
}

const QUERY_TABLE_EXISTS_SQL: &str = include_str!("sql/table_exists.sql");
const QUERY_LIST_TABLES_SQL: &str = include_str!("sql/list_tables.sql");
const QUERY_TABLE_METADATA_SQL: &str = include_str!("sql/table_metadata.sql");

impl PgAdapter {
    /// Exclusive access to a live client.
    pub async fn lock_client(&self) -> Result<RwLockWriteGuard<'_, Client>, DbError> {
        let mut client = self.client.write().await;
        if client.is_closed() {
            warn!("Postgres connection closed; reconnecting");
            *client = connect_client(&self.url).await.map_err(DbError::Reconnect)?;
        }
        Ok(client)
    }

    /// Shared access to a live client.
    async fn client(&self) -> Result<RwLockReadGuard<'_, Client>, DbError> {
        let client = self.client.read().await;
        if !client.is_closed() {
            return Ok(client);
        }
        drop(client);
        Ok(RwLockWriteGuard::downgrade(self.lock_client().await?))
    }

    fn generator(&self) -> QueryGenerator<'_> {
        QueryGenerator::new(&self.dialect)
    }

    async fn exec(&self, query: &str) -> Result<(), DbError> {
        debug!(sql = query, "Executing");
        let client = self.client().await?;
        client.batch_execute(query).await?;
        Ok(())
    }

    async fn insert_chunks(
        &self,
        tx: &Transaction<'_>,
        table: &str,
        columns: &[ColumnDef],
        rows: &[Vec<Value>],
    ) -> Result<u64, DbError> {
        if rows.is_empty() || columns.is_empty() {
            return Ok(0);
        }

        let generator = self.generator();
        let chunk_size = generator.rows_per_insert(columns.len());
        let mut written = 0;

        for chunk in rows.chunks(chunk_size) {
            let sql = generator.insert_rows(table, columns, chunk.len());
            let bindings = PgParamStore::from_rows(columns, chunk);
            written += tx.execute(&sql, &bindings.as_refs()).await?;
        }

        debug!(table, rows = written, chunk_size, "Inserted rows");
        Ok(written)
    }
}

#[async_trait]
impl SqlAdapter for PgAdapter {
    async fn connect(url: &str) -> Result<Self, ConnectorError> {
        let client = Arc::new(RwLock::new(connect_client(url).await?));
        Ok(PgAdapter {
            url: Arc::from(url),
            client,
            dialect: dialect::Postgres,
        })
    }

    async fn ping(&self) -> Result<(), DbError> {
        self.exec("SELECT 1").await
    }

    async fn table_exists(&self, table: &str) -> Result<bool, DbError> {
        let client = self.client().await?;
        let row = client.query_one(QUERY_TABLE_EXISTS_SQL, &[&table]).await?;
        Ok(row.get(0))
    }

    async fn list_tables(&self) -> Result<Vec<String>, DbError> {
        let client = self.client().await?;
        let rows = client.query(QUERY_LIST_TABLES_SQL, &[]).await?;
        let tables = rows
            .iter()
            .map(|row| row.try_get::<_, String>(0))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tables)
    }

    async fn table_metadata(&self, table: &str) -> Result<TableMetadata, DbError> {
        let client = self.client().await?;
        let rows = client.query(QUERY_TABLE_METADATA_SQL, &[&table]).await?;
        if rows.is_empty() {
            return Err(DbError::TableNotFound(table.to_string()));
        }

        let columns = rows
            .iter()
            .map(|row| {
                let name: String = row.try_get(COL_COLUMN_NAME)?;
                let db_type: String = row.try_get(COL_DATA_TYPE)?;
                let nullable: bool = row.try_get(COL_IS_NULLABLE)?;
                let ordinal: i32 = row.try_get(COL_ORDINAL_POSITION)?;
                Ok(ColumnMetadata::new(&name, &db_type, ordinal.max(0) as usize, nullable))
            })
            .collect::<Result<Vec<_>, tokio_postgres::Error>>()?;

        Ok(TableMetadata::new(table, columns))
    }

    async fn count_rows(&self, table: &str) -> Result<u64, DbError> {
        let sql = self.generator().count_rows(table);
        let client = self.client().await?;
        let row = client.query_one(&sql, &[]).await?;
        let count: i64 = row.try_get(0)?;
        Ok(count.max(0) as u64)
    }

    async fn create_table(&self, spec: &TableSpec) -> Result<(), DbError> {
        let sql = self.generator().create_table(spec);
        self.exec(&sql).await
    }

    async fn drop_table(&self, table: &str) -> Result<(), DbError> {
        let sql = self.generator().drop_table(table);
        self.exec(&sql).await
    }

    async fn copy_table(&self, source: &str, target: &str) -> Result<(), DbError> {
        let sql = self.generator().copy_table(source, target);
        self.exec(&sql).await
    }

    async fn copy_columns(&self, source: &str, target: &str, columns: &[ColumnDef]) -> Result<u64, DbError> {
        if columns.is_empty() {
            return Ok(0);
        }
        let sql = self.generator().copy_columns(source, target, columns);
        debug!(%sql, "Copying columns");
        let client = self.client().await?;
        Ok(client.execute(&sql, &[]).await?)
    }

    async fn swap_tables(&self, table: &str, replacement: &str) -> Result<(), DbError> {
        let generator = self.generator();
        let aside = format!("{table}_old");

        let mut client = self.lock_client().await?;
        let tx = client.transaction().await?;
        tx.batch_execute(&generator.drop_table(&aside)).await?;
        tx.batch_execute(&generator.rename_table(table, &aside)).await?;
        tx.batch_execute(&generator.rename_table(replacement, table)).await?;
        tx.batch_execute(&generator.drop_table(&aside)).await?;
        tx.commit().await?;

        debug!(table, replacement, "Swapped tables");
        Ok(())
    }

    async fn replace_rows(&self, spec: &TableSpec, rows: &[Vec<Value>]) -> Result<u64, DbError> {
        let generator = self.generator();
        let mut client = self.lock_client().await?;
        let tx = client.transaction().await?;

        tx.batch_execute(&generator.drop_table(&spec.name)).await?;
        tx.batch_execute(&generator.create_table(spec)).await?;
        let written = self.insert_chunks(&tx, &spec.name, &spec.columns, rows).await?;
        tx.commit().await?;

        Ok(written)
    }

    async fn insert_rows(&self, table: &str, columns: &[ColumnDef], rows: &[Vec<Value>]) -> Result<u64, DbError> {
        let mut client = self.lock_client().await?;
        let tx = client.transaction().await?;
        let written = self.insert_chunks(&tx, table, columns, rows).await?;
        tx.commit().await?;
        Ok(written)
    }
}

impl std::fmt::Debug for PgAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgAdapter")
            .field("dialect", &self.dialect.name())
            .finish()
    }
}
