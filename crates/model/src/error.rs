use thiserror::Error;

/// Violations of the dataset shape invariants.
#[derive(Debug, Error, PartialEq)]
pub enum DatasetError {
    #[error("Invalid column identifier: '{0}'")]
    InvalidColumnName(String),

    #[error("Duplicate column identifier: '{0}'")]
    DuplicateColumn(String),

    #[error("Row has {got} values but dataset has {expected} columns")]
    RowWidth { expected: usize, got: usize },

    #[error("Column '{column}' has {got} values but dataset has {expected} rows")]
    ColumnLength {
        column: String,
        expected: usize,
        got: usize,
    },

    #[error("Unknown column: '{0}'")]
    UnknownColumn(String),
}
