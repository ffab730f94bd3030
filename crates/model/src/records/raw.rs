use crate::core::value::Value;
use serde_json::{Map, Value as JsonValue};

/// One record as returned by a JSON API: field name to scalar.
pub type RawRecord = Map<String, JsonValue>;

/// Untyped tabular data straight from a source, before any name
/// standardization or coercion. Header text is kept verbatim.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>) -> Self {
        RawTable {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Builds a table from JSON records. Headers are the union of keys in
    /// first-seen order; missing fields become `Null`.
    pub fn from_records(records: &[RawRecord]) -> Self {
        let mut headers: Vec<String> = Vec::new();
        for record in records {
            for key in record.keys() {
                if !headers.iter().any(|h| h == key) {
                    headers.push(key.clone());
                }
            }
        }

        let rows = records
            .iter()
            .map(|record| {
                headers
                    .iter()
                    .map(|h| record.get(h).map(json_to_value).unwrap_or(Value::Null))
                    .collect()
            })
            .collect();

        RawTable { headers, rows }
    }

    /// Appends a column, padding or truncating `values` to the row count.
    pub fn push_column(&mut self, header: &str, mut values: Vec<Value>) {
        values.resize(self.rows.len(), Value::Null);
        self.headers.push(header.to_string());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
    }
}

pub fn json_to_value(value: &JsonValue) -> Value {
    match value {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Boolean(*b),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => n
                .as_f64()
                .filter(|f| f.is_finite())
                .map_or(Value::Null, Value::Float),
        },
        JsonValue::String(s) => Value::String(s.clone()),
        JsonValue::Array(_) | JsonValue::Object(_) => Value::String(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn union_of_keys_with_nulls() {
        let records: Vec<RawRecord> = vec![
            json!({"a": 1, "b": "x"}).as_object().cloned().unwrap(),
            json!({"b": "y", "c": 2.5}).as_object().cloned().unwrap(),
        ];

        let table = RawTable::from_records(&records);
        assert_eq!(table.headers, vec!["a", "b", "c"]);
        assert_eq!(
            table.rows[1],
            vec![Value::Null, Value::String("y".into()), Value::Float(2.5)]
        );
    }
}
