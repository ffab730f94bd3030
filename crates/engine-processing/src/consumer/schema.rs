use connectors::sql::base::metadata::table::TableMetadata;
use model::{core::data_type::DataType, records::dataset::ColumnDef};
use std::fmt;

/// One way a destination table no longer fits a dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaDrift {
    MissingColumn(String),
    TypeMismatch {
        column: String,
        expected: DataType,
        found: String,
    },
}

impl fmt::Display for SchemaDrift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaDrift::MissingColumn(c) => write!(f, "column '{c}' missing from table"),
            SchemaDrift::TypeMismatch {
                column,
                expected,
                found,
            } => write!(f, "column '{column}' is {found}, dataset has {expected}"),
        }
    }
}

/// Compares dataset columns against the stored table.
///
/// Extra table columns are fine. Types are compared by coarse family and
/// only for integer, float and timestamp dataset columns.
pub fn find_drift(table: &TableMetadata, columns: &[ColumnDef]) -> Vec<SchemaDrift> {
    columns
        .iter()
        .filter_map(|column| match table.column(&column.name) {
            None => Some(SchemaDrift::MissingColumn(column.name.clone())),
            Some(stored) if !column.data_type.is_compatible(stored.family) => Some(SchemaDrift::TypeMismatch {
                column: column.name.clone(),
                expected: column.data_type,
                found: stored.db_type.clone(),
            }),
            Some(_) => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use connectors::sql::base::metadata::column::ColumnMetadata;

    fn table() -> TableMetadata {
        TableMetadata::new(
            "wb_loans",
            vec![
                ColumnMetadata::new("row_id", "bigint", 1, false),
                ColumnMetadata::new("loan_number", "text", 2, true),
                ColumnMetadata::new("amount_usd", "numeric", 3, true),
                ColumnMetadata::new("as_of_date", "timestamp without time zone", 4, true),
            ],
        )
    }

    #[test]
    fn identical_columns_have_no_drift() {
        let columns = vec![
            ColumnDef::new("loan_number", DataType::String),
            ColumnDef::new("amount_usd", DataType::Float),
            ColumnDef::new("as_of_date", DataType::Timestamp),
        ];
        assert!(find_drift(&table(), &columns).is_empty());
    }

    #[test]
    fn missing_column_is_drift() {
        let columns = vec![
            ColumnDef::new("loan_number", DataType::String),
            ColumnDef::new("region", DataType::String),
        ];
        assert_eq!(
            find_drift(&table(), &columns),
            vec![SchemaDrift::MissingColumn("region".into())]
        );
    }

    #[test]
    fn family_mismatch_is_drift() {
        let columns = vec![
            ColumnDef::new("loan_number", DataType::Int),
            ColumnDef::new("amount_usd", DataType::Float),
        ];
        let drift = find_drift(&table(), &columns);
        assert_eq!(drift.len(), 1);
        assert!(matches!(&drift[0], SchemaDrift::TypeMismatch { column, .. } if column == "loan_number"));
    }
}
