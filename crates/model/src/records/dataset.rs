use crate::{
    core::{data_type::DataType, identifiers::is_valid_identifier, value::Value},
    error::DatasetError,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: DataType,
}

impl ColumnDef {
    pub fn new(name: &str, data_type: DataType) -> Self {
        ColumnDef {
            name: name.to_string(),
            data_type,
        }
    }
}

/// A named, typed, in-memory table produced by the normalizer.
///
/// Column identifiers are always valid and unique, and every row has
/// exactly one value per column. All mutators keep both properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    name: String,
    columns: Vec<ColumnDef>,
    rows: Vec<Vec<Value>>,
}

impl Dataset {
    pub fn new(name: &str, columns: Vec<ColumnDef>) -> Result<Self, DatasetError> {
        let mut seen = HashSet::with_capacity(columns.len());
        for column in &columns {
            if !is_valid_identifier(&column.name) {
                return Err(DatasetError::InvalidColumnName(column.name.clone()));
            }
            if !seen.insert(column.name.as_str()) {
                return Err(DatasetError::DuplicateColumn(column.name.clone()));
            }
        }

        Ok(Dataset {
            name: name.to_string(),
            columns,
            rows: Vec::new(),
        })
    }

    pub fn with_rows(
        name: &str,
        columns: Vec<ColumnDef>,
        rows: Vec<Vec<Value>>,
    ) -> Result<Self, DatasetError> {
        let mut dataset = Dataset::new(name, columns)?;
        dataset.rows.reserve(rows.len());
        for row in rows {
            dataset.push_row(row)?;
        }
        Ok(dataset)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Vec<Value>> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_timestamp_column(&self) -> bool {
        self.columns
            .iter()
            .any(|c| c.data_type == DataType::Timestamp)
    }

    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    /// Iterates the values of one column, in row order.
    pub fn column_values<'a>(&'a self, name: &str) -> Option<impl Iterator<Item = &'a Value> + use<'a>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |r| &r[idx]))
    }

    pub fn push_row(&mut self, row: Vec<Value>) -> Result<(), DatasetError> {
        if row.len() != self.columns.len() {
            return Err(DatasetError::RowWidth {
                expected: self.columns.len(),
                got: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Appends a column with one value per existing row.
    pub fn add_column(&mut self, column: ColumnDef, values: Vec<Value>) -> Result<(), DatasetError> {
        if !is_valid_identifier(&column.name) {
            return Err(DatasetError::InvalidColumnName(column.name));
        }
        if self.has_column(&column.name) {
            return Err(DatasetError::DuplicateColumn(column.name));
        }
        if values.len() != self.rows.len() {
            return Err(DatasetError::ColumnLength {
                column: column.name,
                expected: self.rows.len(),
                got: values.len(),
            });
        }

        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
        self.columns.push(column);
        Ok(())
    }

    pub fn add_constant_column(
        &mut self,
        name: &str,
        data_type: DataType,
        value: Value,
    ) -> Result<(), DatasetError> {
        let values = vec![value; self.rows.len()];
        self.add_column(ColumnDef::new(name, data_type), values)
    }

    /// Adds the column, or overwrites its values and type when it already exists.
    pub fn set_column(&mut self, column: ColumnDef, values: Vec<Value>) -> Result<(), DatasetError> {
        match self.column_index(&column.name) {
            None => self.add_column(column, values),
            Some(idx) => {
                if values.len() != self.rows.len() {
                    return Err(DatasetError::ColumnLength {
                        column: column.name,
                        expected: self.rows.len(),
                        got: values.len(),
                    });
                }
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[idx] = value;
                }
                self.columns[idx] = column;
                Ok(())
            }
        }
    }

    /// Rewrites every value of `name` through `f` and retypes the column.
    pub fn map_column<F>(&mut self, name: &str, data_type: DataType, mut f: F) -> Result<(), DatasetError>
    where
        F: FnMut(Value) -> Value,
    {
        let idx = self
            .column_index(name)
            .ok_or_else(|| DatasetError::UnknownColumn(name.to_string()))?;

        for row in self.rows.iter_mut() {
            let value = std::mem::replace(&mut row[idx], Value::Null);
            row[idx] = f(value);
        }
        self.columns[idx].data_type = data_type;
        Ok(())
    }

    /// Keeps only the rows for which `keep` returns true.
    pub fn retain_rows<F>(&mut self, mut keep: F)
    where
        F: FnMut(&[Value]) -> bool,
    {
        self.rows.retain(|row| keep(row));
    }

    /// Restricts the dataset to the named columns, in the given order.
    pub fn project(&self, names: &[&str]) -> Result<Dataset, DatasetError> {
        let indices = names
            .iter()
            .map(|n| {
                self.column_index(n)
                    .ok_or_else(|| DatasetError::UnknownColumn(n.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let columns = indices.iter().map(|&i| self.columns[i].clone()).collect();
        let rows = self
            .rows
            .iter()
            .map(|r| indices.iter().map(|&i| r[i].clone()).collect())
            .collect();

        Dataset::with_rows(&self.name, columns, rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        Dataset::with_rows(
            "credits",
            vec![
                ColumnDef::new("credit_number", DataType::String),
                ColumnDef::new("amount", DataType::Float),
            ],
            vec![
                vec![Value::String("IDA-1".into()), Value::Float(10.0)],
                vec![Value::String("IDA-2".into()), Value::Null],
            ],
        )
        .unwrap()
    }

    #[test]
    fn rejects_invalid_or_duplicate_identifiers() {
        let err = Dataset::new("x", vec![ColumnDef::new("Bad Name", DataType::String)]);
        assert_eq!(err, Err(DatasetError::InvalidColumnName("Bad Name".into())));

        let err = Dataset::new(
            "x",
            vec![
                ColumnDef::new("a", DataType::String),
                ColumnDef::new("a", DataType::Int),
            ],
        );
        assert_eq!(err, Err(DatasetError::DuplicateColumn("a".into())));
    }

    #[test]
    fn rows_must_match_width() {
        let mut ds = sample();
        assert!(matches!(
            ds.push_row(vec![Value::Null]),
            Err(DatasetError::RowWidth { expected: 2, got: 1 })
        ));
    }

    #[test]
    fn constant_and_mapped_columns() {
        let mut ds = sample();
        ds.add_constant_column("source", DataType::String, Value::String("api".into()))
            .unwrap();
        ds.map_column("amount", DataType::Float, |v| match v {
            Value::Float(f) => Value::Float(f * 2.0),
            other => other,
        })
        .unwrap();

        assert_eq!(ds.column_names(), vec!["credit_number", "amount", "source"]);
        assert_eq!(ds.value(0, "amount"), Some(&Value::Float(20.0)));
        assert_eq!(ds.value(1, "source"), Some(&Value::String("api".into())));
    }

    #[test]
    fn project_keeps_requested_order() {
        let ds = sample().project(&["amount", "credit_number"]).unwrap();
        assert_eq!(ds.column_names(), vec!["amount", "credit_number"]);
        assert_eq!(ds.len(), 2);
    }
}
