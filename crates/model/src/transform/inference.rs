use crate::core::data_type::DataType;

/// Decides a column's semantic type from its standardized name alone.
///
/// Returning `None` leaves the type to be inferred from the values.
pub trait TypeInference: Send + Sync {
    fn infer(&self, column: &str) -> Option<DataType>;
}

const TIMESTAMP_MARKERS: [&str; 2] = ["date", "as_of"];
const NUMERIC_MARKERS: [&str; 3] = ["amount", "cost", "commitment"];

/// Substring rules on standardized column names:
/// `date`/`as_of` mean a timestamp, `amount`/`cost`/`commitment` mean a
/// number. A name matching both is a timestamp.
#[derive(Debug, Clone, Copy, Default)]
pub struct NameHeuristic;

impl TypeInference for NameHeuristic {
    fn infer(&self, column: &str) -> Option<DataType> {
        if TIMESTAMP_MARKERS.iter().any(|m| column.contains(m)) {
            Some(DataType::Timestamp)
        } else if NUMERIC_MARKERS.iter().any(|m| column.contains(m)) {
            Some(DataType::Float)
        } else {
            None
        }
    }
}

/// Inference that never claims a column; every type comes from values.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueOnly;

impl TypeInference for ValueOnly {
    fn infer(&self, _column: &str) -> Option<DataType> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substring_rules() {
        let h = NameHeuristic;
        assert_eq!(h.infer("as_of_date"), Some(DataType::Timestamp));
        assert_eq!(h.infer("board_approval_date"), Some(DataType::Timestamp));
        assert_eq!(h.infer("as_of"), Some(DataType::Timestamp));
        assert_eq!(h.infer("amount_usd"), Some(DataType::Float));
        assert_eq!(h.infer("total_project_cost"), Some(DataType::Float));
        assert_eq!(h.infer("ibrd_commitment"), Some(DataType::Float));
        assert_eq!(h.infer("commitment_date"), Some(DataType::Timestamp));
        assert_eq!(h.infer("updated"), Some(DataType::Timestamp));
        assert_eq!(h.infer("region"), None);
        assert_eq!(h.infer("project_id"), None);
    }
}
