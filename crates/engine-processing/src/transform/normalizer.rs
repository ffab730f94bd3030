use crate::{error::TransformError, transform::coerce};
use chrono::NaiveDateTime;
use model::{
    core::{data_type::DataType, identifiers::standardize_column_name, value::Value},
    records::{
        dataset::{ColumnDef, Dataset},
        raw::{RawRecord, RawTable},
    },
    transform::inference::TypeInference,
};
use std::{collections::HashSet, sync::Arc};
use tracing::{debug, warn};

/// Provenance column added to datasets whose source has no timestamp.
pub const PROVENANCE_COLUMN: &str = "as_of_date";

/// Turns raw source tables into typed datasets for one cycle.
///
/// Column types come from the name rules of the configured
/// [`TypeInference`] first and from the values otherwise.
#[derive(Clone)]
pub struct Normalizer {
    inference: Arc<dyn TypeInference>,
    ingested_at: NaiveDateTime,
}

impl Normalizer {
    pub fn new(inference: Arc<dyn TypeInference>, ingested_at: NaiveDateTime) -> Self {
        Self {
            inference,
            ingested_at,
        }
    }

    pub fn ingested_at(&self) -> NaiveDateTime {
        self.ingested_at
    }

    pub fn normalize_records(&self, name: &str, records: &[RawRecord]) -> Result<Dataset, TransformError> {
        self.normalize(name, RawTable::from_records(records))
    }

    pub fn normalize(&self, name: &str, raw: RawTable) -> Result<Dataset, TransformError> {
        let kept = standardize_headers(name, &raw.headers);

        let mut columns: Vec<Vec<Value>> = vec![Vec::with_capacity(raw.rows.len()); kept.len()];
        for row in raw.rows {
            let mut row = row.into_iter().map(Some).collect::<Vec<_>>();
            for (slot, (idx, _)) in columns.iter_mut().zip(&kept) {
                slot.push(row.get_mut(*idx).and_then(Option::take).unwrap_or(Value::Null));
            }
        }

        let mut defs = Vec::with_capacity(kept.len());
        for ((_, column), values) in kept.iter().zip(columns.iter_mut()) {
            let data_type = match self.inference.infer(column) {
                Some(dt) => dt,
                None => coerce::infer_from_values(values.iter()),
            };

            for value in values.iter_mut() {
                let raw = std::mem::replace(value, Value::Null);
                *value = coerce::coerce(raw, data_type);
            }
            defs.push(ColumnDef::new(column, data_type));
        }

        let rows = transpose(columns);
        let mut dataset =
            Dataset::with_rows(name, defs, rows).map_err(|e| TransformError::dataset(name, e))?;

        if !dataset.has_timestamp_column() && !dataset.has_column(PROVENANCE_COLUMN) {
            dataset
                .add_constant_column(
                    PROVENANCE_COLUMN,
                    DataType::Timestamp,
                    Value::Timestamp(self.ingested_at),
                )
                .map_err(|e| TransformError::dataset(name, e))?;
        }

        debug!(
            dataset = name,
            rows = dataset.len(),
            columns = ?dataset.column_names(),
            "Normalized dataset"
        );
        Ok(dataset)
    }
}

/// Standardized names with their source column index. A blank name becomes
/// `unnamed_<index>`; a name that collides with an earlier one is dropped.
fn standardize_headers(dataset: &str, headers: &[String]) -> Vec<(usize, String)> {
    let mut seen = HashSet::with_capacity(headers.len());
    let mut kept = Vec::with_capacity(headers.len());

    for (idx, header) in headers.iter().enumerate() {
        let mut name = standardize_column_name(header);
        if name.is_empty() {
            name = format!("unnamed_{idx}");
        }

        if !seen.insert(name.clone()) {
            warn!(dataset, column = %header, standardized = %name, "Duplicate column after standardization; keeping the first");
            continue;
        }
        kept.push((idx, name));
    }

    kept
}

fn transpose(columns: Vec<Vec<Value>>) -> Vec<Vec<Value>> {
    let height = columns.first().map_or(0, Vec::len);
    let mut rows: Vec<Vec<Value>> = (0..height).map(|_| Vec::with_capacity(columns.len())).collect();
    for column in columns {
        for (row, value) in rows.iter_mut().zip(column) {
            row.push(value);
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use model::transform::inference::{NameHeuristic, ValueOnly};
    use serde_json::json;

    fn normalizer() -> Normalizer {
        let at = NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        Normalizer::new(Arc::new(NameHeuristic), at)
    }

    fn records(value: serde_json::Value) -> Vec<RawRecord> {
        value
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r.as_object().unwrap().clone())
            .collect()
    }

    #[test]
    fn coerces_by_column_name() {
        let data = records(json!([{"Amount (USD)": "1,234.50", "As Of Date": "12-May-1961"}]));
        let dataset = normalizer().normalize_records("credits", &data).unwrap();

        assert_eq!(dataset.column_names(), vec!["amount_usd", "as_of_date"]);
        assert_eq!(dataset.value(0, "amount_usd"), Some(&Value::Float(1234.5)));
        let expected = NaiveDate::from_ymd_opt(1961, 5, 12)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(dataset.value(0, "as_of_date"), Some(&Value::Timestamp(expected)));
    }

    #[test]
    fn inference_is_pluggable() {
        let data = records(json!([{"Amount (USD)": "1,234.50", "Loan Count": 2}]));
        let dataset = Normalizer::new(Arc::new(ValueOnly), normalizer().ingested_at())
            .normalize_records("credits", &data)
            .unwrap();

        assert_eq!(dataset.column("amount_usd").unwrap().data_type, DataType::String);
        assert_eq!(dataset.value(0, "amount_usd"), Some(&Value::String("1,234.50".into())));
        assert_eq!(dataset.value(0, "loan_count"), Some(&Value::Int(2)));
    }

    #[test]
    fn unparsable_values_become_null() {
        let data = records(json!([
            {"Total Cost": "n/a", "Closing Date": "someday", "Name": "A"},
            {"Total Cost": 10, "Closing Date": null, "Name": "B"}
        ]));
        let dataset = normalizer().normalize_records("projects", &data).unwrap();

        assert_eq!(dataset.value(0, "total_cost"), Some(&Value::Null));
        assert_eq!(dataset.value(1, "total_cost"), Some(&Value::Float(10.0)));
        assert_eq!(dataset.value(0, "closing_date"), Some(&Value::Null));
        assert_eq!(dataset.column("closing_date").unwrap().data_type, DataType::Timestamp);
    }

    #[test]
    fn adds_provenance_without_timestamp_column() {
        let data = records(json!([{"Project": "P1", "Count": 3}]));
        let n = normalizer();
        let dataset = n.normalize_records("themes", &data).unwrap();

        assert_eq!(dataset.column("count").unwrap().data_type, DataType::Int);
        assert_eq!(
            dataset.value(0, PROVENANCE_COLUMN),
            Some(&Value::Timestamp(n.ingested_at()))
        );
    }

    #[test]
    fn duplicate_and_blank_headers() {
        let raw = RawTable {
            headers: vec!["Region".into(), "REGION".into(), "".into(), "Board Date".into()],
            rows: vec![vec![
                Value::String("Africa".into()),
                Value::String("dup".into()),
                Value::Int(1),
                Value::Null,
            ]],
        };
        let dataset = normalizer().normalize("sectors", raw).unwrap();

        assert_eq!(dataset.column_names(), vec!["region", "unnamed_2", "board_date"]);
        assert_eq!(dataset.value(0, "region"), Some(&Value::String("Africa".into())));
        assert!(!dataset.has_column(PROVENANCE_COLUMN));
    }
}
