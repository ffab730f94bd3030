use async_trait::async_trait;
use connectors::{
    error::{ConnectorError, DbError},
    sql::base::{
        adapter::SqlAdapter,
        metadata::{
            column::ColumnMetadata,
            table::{KeySpec, TableMetadata, TableSpec},
        },
    },
};
use model::{
    core::value::Value,
    execution::mapping::SURROGATE_KEY_COLUMN,
    records::dataset::ColumnDef,
};
use std::{
    collections::{BTreeMap, HashMap},
    io,
    sync::Mutex,
};

#[derive(Debug, Clone)]
pub struct MemoryTable {
    pub columns: Vec<ColumnMetadata>,
    pub key: KeySpec,
    pub rows: Vec<Vec<Value>>,
    next_id: i64,
}

impl MemoryTable {
    fn create(spec: &TableSpec) -> Self {
        MemoryTable {
            columns: spec.stored_columns(),
            key: spec.key.clone(),
            rows: Vec::new(),
            next_id: 1,
        }
    }

    fn index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    fn has_surrogate(&self) -> bool {
        self.key == KeySpec::Surrogate
    }

    /// Lays `values` (in `columns` order) out in table order, filling the
    /// surrogate key and leaving unmentioned columns null.
    fn insert(&mut self, columns: &[ColumnDef], values: &[Value]) -> Result<(), DbError> {
        let mut row = vec![Value::Null; self.columns.len()];
        for (column, value) in columns.iter().zip(values) {
            let idx = self
                .index(&column.name)
                .ok_or_else(|| DbError::Write(format!("column \"{}\" does not exist", column.name)))?;
            row[idx] = value.clone().conform_to(column.data_type);
        }

        if self.has_surrogate()
            && let Some(idx) = self.index(SURROGATE_KEY_COLUMN)
        {
            row[idx] = Value::Int(self.next_id);
            self.next_id += 1;
        }

        if let KeySpec::Natural(keys) = &self.key {
            let key_of = |r: &Vec<Value>| -> Vec<Value> {
                keys.iter()
                    .filter_map(|k| self.index(k))
                    .map(|i| r[i].clone())
                    .collect()
            };
            let key = key_of(&row);
            if self.rows.iter().any(|r| key_of(r) == key) {
                return Err(DbError::Write(format!("duplicate key value {key:?}")));
            }
        }

        self.rows.push(row);
        Ok(())
    }

    pub fn column_values(&self, name: &str) -> Vec<Value> {
        match self.index(name) {
            Some(idx) => self.rows.iter().map(|r| r[idx].clone()).collect(),
            None => Vec::new(),
        }
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

/// Failure scripted for one adapter operation.
#[derive(Debug, Clone, Copy)]
pub enum Failure {
    /// Connection-level error, retried by the writer's classifiers.
    Transient,
    /// Statement-level error.
    Permanent,
}

impl Failure {
    fn error(self, op: &str) -> DbError {
        match self {
            Failure::Transient => DbError::Io(io::Error::new(
                io::ErrorKind::ConnectionReset,
                format!("{op}: connection reset"),
            )),
            Failure::Permanent => DbError::Write(format!("{op}: scripted failure")),
        }
    }
}

#[derive(Default)]
struct State {
    tables: BTreeMap<String, MemoryTable>,
    failures: HashMap<String, (Failure, usize)>,
    calls: Vec<String>,
}

/// A [`SqlAdapter`] keeping tables in memory, with scripted failures per
/// operation and a log of every call.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `times` calls of `op` fail.
    pub fn fail(&self, op: &str, failure: Failure, times: usize) {
        self.state
            .lock()
            .unwrap()
            .failures
            .insert(op.to_string(), (failure, times));
    }

    pub fn table(&self, name: &str) -> Option<MemoryTable> {
        self.state.lock().unwrap().tables.get(name).cloned()
    }

    pub fn table_names(&self) -> Vec<String> {
        self.state.lock().unwrap().tables.keys().cloned().collect()
    }

    /// Operation names in call order, e.g. `"copy_table wb_projects"`.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn calls_of(&self, op: &str) -> usize {
        self.calls().iter().filter(|c| c.split(' ').next() == Some(op)).count()
    }

    /// Seeds a table directly, bypassing the call log.
    pub fn seed(&self, spec: &TableSpec, rows: &[Vec<Value>]) {
        let mut table = MemoryTable::create(spec);
        for row in rows {
            table.insert(&spec.columns, row).unwrap();
        }
        self.state.lock().unwrap().tables.insert(spec.name.clone(), table);
    }

    fn enter(&self, op: &str, subject: &str) -> Result<std::sync::MutexGuard<'_, State>, DbError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("{op} {subject}"));
        if let Some((failure, remaining)) = state.failures.get_mut(op)
            && *remaining > 0
        {
            *remaining -= 1;
            return Err(failure.error(op));
        }
        Ok(state)
    }
}

fn missing(table: &str) -> DbError {
    DbError::TableNotFound(table.to_string())
}

#[async_trait]
impl SqlAdapter for MemoryStore {
    async fn connect(_url: &str) -> Result<Self, ConnectorError> {
        Ok(MemoryStore::new())
    }

    async fn ping(&self) -> Result<(), DbError> {
        self.enter("ping", "").map(|_| ())
    }

    async fn table_exists(&self, table: &str) -> Result<bool, DbError> {
        let state = self.enter("table_exists", table)?;
        Ok(state.tables.contains_key(table))
    }

    async fn list_tables(&self) -> Result<Vec<String>, DbError> {
        let state = self.enter("list_tables", "")?;
        Ok(state.tables.keys().cloned().collect())
    }

    async fn table_metadata(&self, table: &str) -> Result<TableMetadata, DbError> {
        let state = self.enter("table_metadata", table)?;
        let t = state.tables.get(table).ok_or_else(|| missing(table))?;
        Ok(TableMetadata::new(table, t.columns.clone()))
    }

    async fn count_rows(&self, table: &str) -> Result<u64, DbError> {
        let state = self.enter("count_rows", table)?;
        let t = state.tables.get(table).ok_or_else(|| missing(table))?;
        Ok(t.rows.len() as u64)
    }

    async fn create_table(&self, spec: &TableSpec) -> Result<(), DbError> {
        let mut state = self.enter("create_table", &spec.name)?;
        if state.tables.contains_key(&spec.name) {
            return Err(DbError::Write(format!("relation \"{}\" already exists", spec.name)));
        }
        state.tables.insert(spec.name.clone(), MemoryTable::create(spec));
        Ok(())
    }

    async fn drop_table(&self, table: &str) -> Result<(), DbError> {
        let mut state = self.enter("drop_table", table)?;
        state.tables.remove(table);
        Ok(())
    }

    async fn copy_table(&self, source: &str, target: &str) -> Result<(), DbError> {
        let mut state = self.enter("copy_table", source)?;
        if state.tables.contains_key(target) {
            return Err(DbError::Write(format!("relation \"{target}\" already exists")));
        }
        let mut copy = state.tables.get(source).cloned().ok_or_else(|| missing(source))?;
        // CREATE TABLE AS keeps no constraints.
        copy.key = KeySpec::None;
        state.tables.insert(target.to_string(), copy);
        Ok(())
    }

    async fn copy_columns(&self, source: &str, target: &str, columns: &[ColumnDef]) -> Result<u64, DbError> {
        let mut state = self.enter("copy_columns", target)?;
        let from = state.tables.get(source).ok_or_else(|| missing(source))?;
        let indices = columns
            .iter()
            .map(|c| from.index(&c.name).ok_or_else(|| DbError::Write(format!("column \"{}\" does not exist", c.name))))
            .collect::<Result<Vec<_>, _>>()?;
        let rows: Vec<Vec<Value>> = from
            .rows
            .iter()
            .map(|r| indices.iter().map(|&i| r[i].clone()).collect())
            .collect();

        let to = state.tables.get_mut(target).ok_or_else(|| missing(target))?;
        for row in &rows {
            to.insert(columns, row)?;
        }
        Ok(rows.len() as u64)
    }

    async fn swap_tables(&self, table: &str, replacement: &str) -> Result<(), DbError> {
        let mut state = self.enter("swap_tables", table)?;
        let new = state.tables.remove(replacement).ok_or_else(|| missing(replacement))?;
        state.tables.insert(table.to_string(), new);
        Ok(())
    }

    async fn replace_rows(&self, spec: &TableSpec, rows: &[Vec<Value>]) -> Result<u64, DbError> {
        let mut state = self.enter("replace_rows", &spec.name)?;
        let mut table = MemoryTable::create(spec);
        for row in rows {
            table.insert(&spec.columns, row)?;
        }
        state.tables.insert(spec.name.clone(), table);
        Ok(rows.len() as u64)
    }

    async fn insert_rows(&self, table: &str, columns: &[ColumnDef], rows: &[Vec<Value>]) -> Result<u64, DbError> {
        let mut state = self.enter("insert_rows", table)?;
        let existing = state.tables.get(table).ok_or_else(|| missing(table))?;

        // All or nothing, like the transaction it stands in for.
        let mut staged = existing.clone();
        for row in rows {
            staged.insert(columns, row)?;
        }
        state.tables.insert(table.to_string(), staged);
        Ok(rows.len() as u64)
    }
}
