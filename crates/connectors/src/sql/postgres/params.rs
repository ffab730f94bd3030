use chrono::NaiveDateTime;
use model::{
    core::{data_type::DataType, value::Value},
    records::dataset::ColumnDef,
};
use tokio_postgres::types::ToSql;

pub struct PgParam(Box<dyn ToSql + Sync + Send>);

impl PgParam {
    /// Binds `value` as `data_type`. Values are conformed to the column
    /// type first, so nulls are always typed.
    pub fn from_value(value: Value, data_type: DataType) -> Self {
        match value.conform_to(data_type) {
            Value::Int(v) => PgParam(Box::new(v)),
            Value::Float(v) => PgParam(Box::new(v)),
            Value::String(v) => PgParam(Box::new(v)),
            Value::Boolean(v) => PgParam(Box::new(v)),
            Value::Timestamp(v) => PgParam(Box::new(v)),
            Value::StringArray(v) => PgParam(Box::new(v)),
            Value::Null => PgParam::null(data_type),
        }
    }

    pub fn null(data_type: DataType) -> Self {
        match data_type {
            DataType::String => PgParam(Box::new(Option::<String>::None)),
            DataType::Int => PgParam(Box::new(Option::<i64>::None)),
            DataType::Float => PgParam(Box::new(Option::<f64>::None)),
            DataType::Timestamp => PgParam(Box::new(Option::<NaiveDateTime>::None)),
            DataType::Boolean => PgParam(Box::new(Option::<bool>::None)),
            DataType::StringArray => PgParam(Box::new(Option::<Vec<String>>::None)),
        }
    }
}

impl AsRef<dyn ToSql + Sync> for PgParam {
    fn as_ref(&self) -> &(dyn ToSql + Sync + 'static) {
        &*self.0
    }
}

pub struct PgParamStore {
    pub params: Vec<PgParam>,
}

impl PgParamStore {
    /// Flattens `rows` row-major, binding each value with its column's type.
    pub fn from_rows(columns: &[ColumnDef], rows: &[Vec<Value>]) -> Self {
        let mut params = Vec::with_capacity(columns.len() * rows.len());
        for row in rows {
            for (col, value) in columns.iter().zip(row) {
                params.push(PgParam::from_value(value.clone(), col.data_type));
            }
        }
        Self { params }
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn as_refs(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params
            .iter()
            .map(|param| param.as_ref())
            .collect::<Vec<_>>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flattens_row_major() {
        let columns = vec![
            ColumnDef::new("a", DataType::Int),
            ColumnDef::new("b", DataType::String),
        ];
        let rows = vec![
            vec![Value::Int(1), Value::Null],
            vec![Value::String("2".into()), Value::String("x".into())],
        ];

        let store = PgParamStore::from_rows(&columns, &rows);
        assert_eq!(store.len(), 4);
        assert_eq!(store.as_refs().len(), 4);
    }
}
