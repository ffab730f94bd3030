use crate::core::data_type::DataType;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::hash::Hash;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    Timestamp(NaiveDateTime),
    StringArray(Vec<String>),
    Null,
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        use Value::*;
        std::mem::discriminant(self).hash(state);
        match self {
            Int(v) => v.hash(state),
            Float(v) => {
                // Hash the bits of the float to handle NaN and -0.0 correctly
                let bits = v.to_bits();
                bits.hash(state);
            }
            String(v) => v.hash(state),
            Boolean(v) => v.hash(state),
            Timestamp(v) => v.hash(state),
            StringArray(v) => v.hash(state),
            Null => {}
        }
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::String(v) => v.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
            Value::Boolean(v) => Some(if *v { 1.0 } else { 0.0 }),
            Value::Timestamp(_) => None,
            Value::StringArray(_) => None,
            Value::Null => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Float(v) if v.fract() == 0.0 && v.is_finite() => Some(*v as i64),
            Value::String(v) => v.trim().parse::<i64>().ok(),
            _ => None,
        }
    }

    /// Plain text rendering, `None` for null.
    pub fn as_string(&self) -> Option<String> {
        match self {
            Value::Int(v) => Some(v.to_string()),
            Value::Float(v) => Some(v.to_string()),
            Value::String(v) => Some(v.clone()),
            Value::Boolean(v) => Some(v.to_string()),
            Value::Timestamp(v) => Some(v.format("%Y-%m-%d %H:%M:%S").to_string()),
            Value::StringArray(v) => Some(v.join(";")),
            Value::Null => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Int(v) => Some(*v != 0),
            Value::Float(v) => Some(*v != 0.0),
            Value::String(v) => match v.trim().to_lowercase().as_str() {
                "true" | "t" | "yes" | "y" | "1" => Some(true),
                "false" | "f" | "no" | "n" | "0" => Some(false),
                _ => None,
            },
            Value::Boolean(v) => Some(*v),
            Value::Timestamp(_) => None,
            Value::StringArray(_) => None,
            Value::Null => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Timestamp(v) => Some(*v),
            _ => None,
        }
    }

    /// Type of a non-null value; `None` for `Null`.
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Value::Int(_) => Some(DataType::Int),
            Value::Float(_) => Some(DataType::Float),
            Value::String(_) => Some(DataType::String),
            Value::Boolean(_) => Some(DataType::Boolean),
            Value::Timestamp(_) => Some(DataType::Timestamp),
            Value::StringArray(_) => Some(DataType::StringArray),
            Value::Null => None,
        }
    }

    /// Converts the value so that it fits a column of `data_type`.
    /// Values that cannot be represented become `Null`.
    pub fn conform_to(self, data_type: DataType) -> Value {
        if self.is_null() || self.data_type() == Some(data_type) {
            return self;
        }

        match data_type {
            DataType::String => self.as_string().map_or(Value::Null, Value::String),
            DataType::Int => self.as_i64().map_or(Value::Null, Value::Int),
            DataType::Float => self.as_f64().map_or(Value::Null, Value::Float),
            DataType::Boolean => self.as_bool().map_or(Value::Null, Value::Boolean),
            DataType::Timestamp => Value::Null,
            DataType::StringArray => match self {
                Value::String(s) => Value::StringArray(vec![s]),
                other => other
                    .as_string()
                    .map_or(Value::Null, |s| Value::StringArray(vec![s])),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn conform_converts_or_nulls() {
        assert_eq!(Value::Int(3).conform_to(DataType::Float), Value::Float(3.0));
        assert_eq!(
            Value::Float(2.5).conform_to(DataType::String),
            Value::String("2.5".into())
        );
        assert_eq!(Value::Float(2.5).conform_to(DataType::Int), Value::Null);
        assert_eq!(
            Value::String("abc".into()).conform_to(DataType::Timestamp),
            Value::Null
        );
        assert_eq!(
            Value::String("TRUE".into()).conform_to(DataType::Boolean),
            Value::Boolean(true)
        );
    }

    #[test]
    fn non_finite_strings_are_not_numbers() {
        assert_eq!(Value::String("NaN".into()).as_f64(), None);
        assert_eq!(Value::String("inf".into()).as_f64(), None);
    }

    #[test]
    fn timestamp_text_is_iso_like() {
        let ts = NaiveDate::from_ymd_opt(1961, 5, 12)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap();
        assert_eq!(
            Value::Timestamp(ts).as_string().as_deref(),
            Some("1961-05-12 00:00:00")
        );
    }
}
