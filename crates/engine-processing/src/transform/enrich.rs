//! Derived columns for the known API dataset shapes.

use crate::transform::{
    coerce::{to_numeric, to_timestamp},
    pipeline::Transform,
};
use chrono::{Datelike, NaiveDateTime};
use model::{
    core::{data_type::DataType, value::Value},
    error::DatasetError,
    records::dataset::{ColumnDef, Dataset},
};
use tracing::warn;

pub const PROCESSED_AT_COLUMN: &str = "processed_at";

/// Stamps every row with the time the cycle processed it.
pub struct ProcessedAt(pub NaiveDateTime);

impl Transform for ProcessedAt {
    fn name(&self) -> &'static str {
        "processed_at"
    }

    fn apply(&self, dataset: &mut Dataset) -> Result<(), DatasetError> {
        let values = vec![Value::Timestamp(self.0); dataset.len()];
        dataset.set_column(ColumnDef::new(PROCESSED_AT_COLUMN, DataType::Timestamp), values)
    }
}

/// IDA credit statements: USD amounts, repayment totals and rates.
pub struct CreditStatementRules;

impl CreditStatementRules {
    pub const DATASET: &'static str = "credit_statements";

    const REPAID_TO_IDA: &'static str = "repaid_to_ida_us";
    const REPAID_THIRD_PARTY: &'static str = "repaid_3rd_party_us";
    const DISBURSED: &'static str = "disbursed_amount_us";
}

impl Transform for CreditStatementRules {
    fn name(&self) -> &'static str {
        "credit_statements"
    }

    fn apply(&self, dataset: &mut Dataset) -> Result<(), DatasetError> {
        trim_strings(dataset)?;

        if dataset.has_column("region") {
            dataset.map_column("region", DataType::String, |v| match v {
                Value::String(s) => Value::String(title_case(&s)),
                other => other,
            })?;
        }

        // `_us` marks a USD amount.
        let usd: Vec<String> = dataset
            .columns()
            .iter()
            .filter(|c| c.name.ends_with("_us"))
            .map(|c| c.name.clone())
            .collect();
        for column in usd.iter().map(String::as_str).chain(["service_charge_rate"]) {
            if dataset.has_column(column) {
                dataset.map_column(column, DataType::Float, to_numeric)?;
            }
        }

        if dataset.has_column("end_of_period") {
            dataset.map_column("end_of_period", DataType::Timestamp, to_timestamp)?;
        }

        let (Some(ida), Some(third), Some(disbursed)) = (
            dataset.column_index(Self::REPAID_TO_IDA),
            dataset.column_index(Self::REPAID_THIRD_PARTY),
            dataset.column_index(Self::DISBURSED),
        ) else {
            warn!(dataset = dataset.name(), "Repayment columns missing; skipping repayment totals");
            return Ok(());
        };

        let mut totals = Vec::with_capacity(dataset.len());
        let mut rates = Vec::with_capacity(dataset.len());
        for row in dataset.rows() {
            let total = match (row[ida].as_f64(), row[third].as_f64()) {
                (Some(a), Some(b)) => Some(a + b),
                _ => None,
            };
            let rate = match (total, row[disbursed].as_f64()) {
                (Some(t), Some(d)) if d != 0.0 => Some(t / d),
                _ => None,
            };
            totals.push(total.map_or(Value::Null, Value::Float));
            rates.push(rate.map_or(Value::Null, Value::Float));
        }

        dataset.set_column(ColumnDef::new("total_repayment", DataType::Float), totals)?;
        dataset.set_column(ColumnDef::new("repayment_rate", DataType::Float), rates)
    }
}

/// Contract awards: supplier locality, contract age and fiscal breakdown.
pub struct ContractAwardRules;

impl ContractAwardRules {
    pub const DATASET: &'static str = "contract_awards";

    const AS_OF: &'static str = "as_of_date";
    const SIGNED: &'static str = "contract_signing_date";
    const SUPPLIER_COUNTRY: &'static str = "supplier_country_code";
    const BORROWER_COUNTRY: &'static str = "borrower_country_code";
    const GLOBAL_PRACTICE: &'static str = "project_global_practice";
}

impl Transform for ContractAwardRules {
    fn name(&self) -> &'static str {
        "contract_awards"
    }

    fn apply(&self, dataset: &mut Dataset) -> Result<(), DatasetError> {
        trim_strings(dataset)?;

        if dataset.has_column("fiscal_year") {
            dataset.map_column("fiscal_year", DataType::Int, |v| {
                to_numeric(v)
                    .as_f64()
                    .filter(|f| f.fract() == 0.0)
                    .map_or(Value::Null, |f| Value::Int(f as i64))
            })?;
        }

        if dataset.has_column(Self::GLOBAL_PRACTICE) {
            dataset.map_column(Self::GLOBAL_PRACTICE, DataType::StringArray, split_practices)?;
        }

        if let (Some(supplier), Some(borrower)) = (
            dataset.column_index(Self::SUPPLIER_COUNTRY),
            dataset.column_index(Self::BORROWER_COUNTRY),
        ) {
            let flags = dataset
                .rows()
                .iter()
                .map(|row| {
                    let domestic = !row[supplier].is_null() && row[supplier] == row[borrower];
                    Value::Boolean(domestic)
                })
                .collect();
            dataset.set_column(ColumnDef::new("is_domestic_supplier", DataType::Boolean), flags)?;
        }

        let signed = dataset.column_index(Self::SIGNED);

        if let (Some(as_of), Some(signed)) = (dataset.column_index(Self::AS_OF), signed) {
            let ages = dataset
                .rows()
                .iter()
                .map(|row| match (row[as_of].as_timestamp(), row[signed].as_timestamp()) {
                    (Some(a), Some(s)) => Value::Int((a - s).num_days()),
                    _ => Value::Null,
                })
                .collect();
            dataset.set_column(ColumnDef::new("contract_age_days", DataType::Int), ages)?;
        }

        if let Some(signed) = signed {
            let quarters = dataset
                .rows()
                .iter()
                .map(|row| {
                    row[signed]
                        .as_timestamp()
                        .map_or(Value::Null, |t| Value::Int(i64::from(t.month0() / 3 + 1)))
                })
                .collect();
            dataset.set_column(ColumnDef::new("fiscal_quarter", DataType::Int), quarters)?;
        }

        Ok(())
    }
}

fn trim_strings(dataset: &mut Dataset) -> Result<(), DatasetError> {
    let text: Vec<String> = dataset
        .columns()
        .iter()
        .filter(|c| c.data_type == DataType::String)
        .map(|c| c.name.clone())
        .collect();

    for column in &text {
        dataset.map_column(column, DataType::String, |v| match v {
            Value::String(s) if s.trim().len() != s.len() => Value::String(s.trim().to_string()),
            other => other,
        })?;
    }
    Ok(())
}

fn split_practices(value: Value) -> Value {
    match value {
        Value::String(s) => Value::StringArray(
            s.split(';')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect(),
        ),
        Value::StringArray(_) => value,
        _ => Value::Null,
    }
}

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for ch in s.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> Value {
        Value::Timestamp(NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap())
    }

    fn s(v: &str) -> Value {
        Value::String(v.to_string())
    }

    #[test]
    fn credit_statement_totals() {
        let mut dataset = Dataset::with_rows(
            "credit_statements",
            vec![
                ColumnDef::new("region", DataType::String),
                ColumnDef::new("repaid_to_ida_us", DataType::String),
                ColumnDef::new("repaid_3rd_party_us", DataType::Float),
                ColumnDef::new("disbursed_amount_us", DataType::Float),
            ],
            vec![
                vec![s(" EAST ASIA AND PACIFIC "), s("1,000"), Value::Float(500.0), Value::Float(3000.0)],
                vec![s("AFRICA"), s("10"), Value::Float(5.0), Value::Float(0.0)],
                vec![Value::Null, Value::Null, Value::Float(5.0), Value::Float(10.0)],
            ],
        )
        .unwrap();

        CreditStatementRules.apply(&mut dataset).unwrap();

        assert_eq!(dataset.value(0, "region"), Some(&s("East Asia And Pacific")));
        assert_eq!(dataset.value(0, "total_repayment"), Some(&Value::Float(1500.0)));
        assert_eq!(dataset.value(0, "repayment_rate"), Some(&Value::Float(0.5)));
        assert_eq!(dataset.value(1, "total_repayment"), Some(&Value::Float(15.0)));
        assert_eq!(dataset.value(1, "repayment_rate"), Some(&Value::Null));
        assert_eq!(dataset.value(2, "total_repayment"), Some(&Value::Null));
    }

    #[test]
    fn contract_award_derivations() {
        let mut dataset = Dataset::with_rows(
            "contract_awards",
            vec![
                ColumnDef::new("as_of_date", DataType::Timestamp),
                ColumnDef::new("contract_signing_date", DataType::Timestamp),
                ColumnDef::new("supplier_country_code", DataType::String),
                ColumnDef::new("borrower_country_code", DataType::String),
                ColumnDef::new("fiscal_year", DataType::String),
                ColumnDef::new("project_global_practice", DataType::String),
            ],
            vec![
                vec![date(2024, 1, 31), date(2023, 11, 2), s("KE"), s("KE"), s("2024"), s("Water;Energy & Extractives")],
                vec![date(2024, 1, 31), Value::Null, s("FR"), s("KE"), s("n/a"), Value::Null],
            ],
        )
        .unwrap();

        ContractAwardRules.apply(&mut dataset).unwrap();

        assert_eq!(dataset.value(0, "is_domestic_supplier"), Some(&Value::Boolean(true)));
        assert_eq!(dataset.value(1, "is_domestic_supplier"), Some(&Value::Boolean(false)));
        assert_eq!(dataset.value(0, "contract_age_days"), Some(&Value::Int(90)));
        assert_eq!(dataset.value(1, "contract_age_days"), Some(&Value::Null));
        assert_eq!(dataset.value(0, "fiscal_quarter"), Some(&Value::Int(4)));
        assert_eq!(dataset.value(0, "fiscal_year"), Some(&Value::Int(2024)));
        assert_eq!(dataset.value(1, "fiscal_year"), Some(&Value::Null));
        assert_eq!(
            dataset.value(0, "project_global_practice"),
            Some(&Value::StringArray(vec!["Water".into(), "Energy & Extractives".into()]))
        );
    }

    #[test]
    fn processed_at_overwrites() {
        let at = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap().and_hms_opt(8, 0, 0).unwrap();
        let mut dataset = Dataset::with_rows(
            "loan_statements",
            vec![ColumnDef::new("processed_at", DataType::String)],
            vec![vec![s("old")]],
        )
        .unwrap();

        ProcessedAt(at).apply(&mut dataset).unwrap();
        assert_eq!(dataset.value(0, PROCESSED_AT_COLUMN), Some(&Value::Timestamp(at)));
        assert_eq!(dataset.column(PROCESSED_AT_COLUMN).unwrap().data_type, DataType::Timestamp);
    }
}
