use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::{borrow::Cow, collections::HashMap, fmt};

/// Semantic column type carried by a dataset column.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    String,
    Int,
    Float,
    Timestamp,
    Boolean,
    StringArray,
}

/// Coarse grouping of storage types. Schema verification only compares
/// families, never exact storage types.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TypeFamily {
    Integer,
    Numeric,
    Timestamp,
    Boolean,
    Text,
    Array,
    Other,
}

lazy_static! {
    static ref POSTGRES_FAMILY_MAP: HashMap<&'static str, TypeFamily> = build_postgres_family_map();
}

impl DataType {
    pub fn postgres_name(&self) -> Cow<'static, str> {
        match self {
            DataType::String => Cow::Borrowed("TEXT"),
            DataType::Int => Cow::Borrowed("BIGINT"),
            DataType::Float => Cow::Borrowed("DOUBLE PRECISION"),
            DataType::Timestamp => Cow::Borrowed("TIMESTAMP"),
            DataType::Boolean => Cow::Borrowed("BOOLEAN"),
            DataType::StringArray => Cow::Borrowed("TEXT[]"),
        }
    }

    pub fn family(&self) -> TypeFamily {
        match self {
            DataType::String => TypeFamily::Text,
            DataType::Int => TypeFamily::Integer,
            DataType::Float => TypeFamily::Numeric,
            DataType::Timestamp => TypeFamily::Timestamp,
            DataType::Boolean => TypeFamily::Boolean,
            DataType::StringArray => TypeFamily::Array,
        }
    }

    /// Whether an existing storage column of `family` can hold values of this type.
    ///
    /// Only integer, numeric and timestamp columns are checked; every other
    /// type is accepted regardless of the storage family.
    pub fn is_compatible(&self, family: TypeFamily) -> bool {
        match self {
            DataType::Int => family == TypeFamily::Integer,
            DataType::Float => family == TypeFamily::Numeric,
            DataType::Timestamp => family == TypeFamily::Timestamp,
            DataType::String | DataType::Boolean | DataType::StringArray => true,
        }
    }
}

impl TypeFamily {
    /// Maps an `information_schema.columns.data_type` value to its family.
    pub fn from_postgres_type(type_name: &str) -> Self {
        let normalized = normalize_type_name(type_name);
        if normalized.ends_with("[]") || normalized == "array" {
            return TypeFamily::Array;
        }

        POSTGRES_FAMILY_MAP
            .get(normalized.as_str())
            .copied()
            .unwrap_or(TypeFamily::Other)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::String => "string",
            DataType::Int => "integer",
            DataType::Float => "float",
            DataType::Timestamp => "datetime",
            DataType::Boolean => "boolean",
            DataType::StringArray => "string[]",
        };
        f.write_str(name)
    }
}

fn normalize_type_name(type_name: &str) -> String {
    let lowered = type_name.trim().to_lowercase();
    match lowered.find('(') {
        Some(idx) => {
            let close = lowered.rfind(')').unwrap_or(lowered.len() - 1);
            let mut base = lowered[..idx].trim_end().to_string();
            base.push_str(&lowered[close + 1..]);
            base
        }
        None => lowered,
    }
}

fn build_postgres_family_map() -> HashMap<&'static str, TypeFamily> {
    HashMap::from([
        ("smallint", TypeFamily::Integer),
        ("integer", TypeFamily::Integer),
        ("int", TypeFamily::Integer),
        ("int2", TypeFamily::Integer),
        ("int4", TypeFamily::Integer),
        ("int8", TypeFamily::Integer),
        ("bigint", TypeFamily::Integer),
        ("serial", TypeFamily::Integer),
        ("bigserial", TypeFamily::Integer),
        ("real", TypeFamily::Numeric),
        ("float4", TypeFamily::Numeric),
        ("float8", TypeFamily::Numeric),
        ("double precision", TypeFamily::Numeric),
        ("numeric", TypeFamily::Numeric),
        ("decimal", TypeFamily::Numeric),
        ("timestamp", TypeFamily::Timestamp),
        ("timestamp without time zone", TypeFamily::Timestamp),
        ("timestamp with time zone", TypeFamily::Timestamp),
        ("timestamptz", TypeFamily::Timestamp),
        ("date", TypeFamily::Timestamp),
        ("boolean", TypeFamily::Boolean),
        ("bool", TypeFamily::Boolean),
        ("text", TypeFamily::Text),
        ("character varying", TypeFamily::Text),
        ("varchar", TypeFamily::Text),
        ("character", TypeFamily::Text),
        ("char", TypeFamily::Text),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_information_schema_names() {
        assert_eq!(TypeFamily::from_postgres_type("bigint"), TypeFamily::Integer);
        assert_eq!(
            TypeFamily::from_postgres_type("timestamp without time zone"),
            TypeFamily::Timestamp
        );
        assert_eq!(
            TypeFamily::from_postgres_type("NUMERIC(12, 2)"),
            TypeFamily::Numeric
        );
        assert_eq!(TypeFamily::from_postgres_type("ARRAY"), TypeFamily::Array);
        assert_eq!(TypeFamily::from_postgres_type("jsonb"), TypeFamily::Other);
    }

    #[test]
    fn only_numeric_and_time_types_are_family_checked() {
        assert!(DataType::Float.is_compatible(TypeFamily::Numeric));
        assert!(!DataType::Float.is_compatible(TypeFamily::Text));
        assert!(!DataType::Int.is_compatible(TypeFamily::Numeric));
        assert!(!DataType::Timestamp.is_compatible(TypeFamily::Text));
        assert!(DataType::String.is_compatible(TypeFamily::Integer));
    }
}
