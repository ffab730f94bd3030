use chrono::{DateTime, NaiveDate, NaiveDateTime};
use model::{core::data_type::DataType, core::value::Value};

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%d-%b-%Y %H:%M:%S",
];

/// `12-May-1961` is the catalog API's format; the rest cover spreadsheet
/// and CSV exports.
const DATE_FORMATS: [&str; 6] = [
    "%d-%b-%Y",
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%Y/%m/%d",
];

/// Coerces a value into a timestamp. Never fails: anything that does not
/// parse becomes `Null`.
pub fn to_timestamp(value: Value) -> Value {
    match value {
        Value::Timestamp(_) => value,
        Value::String(s) => parse_timestamp(&s).map_or(Value::Null, Value::Timestamp),
        _ => Value::Null,
    }
}

pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(raw, f).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(raw, f).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Coerces a value into a float after stripping thousands separators and
/// whitespace. Never fails: anything that does not parse becomes `Null`.
pub fn to_numeric(value: Value) -> Value {
    match value {
        Value::Float(f) if f.is_finite() => Value::Float(f),
        Value::Int(i) => Value::Float(i as f64),
        Value::String(s) => parse_numeric(&s).map_or(Value::Null, Value::Float),
        _ => Value::Null,
    }
}

pub fn parse_numeric(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|f| f.is_finite())
}

/// Narrowest type that holds every non-null value; text when they disagree.
pub fn infer_from_values<'a>(values: impl IntoIterator<Item = &'a Value>) -> DataType {
    let mut inferred: Option<DataType> = None;

    for value in values {
        let Some(dt) = value.data_type() else {
            continue;
        };
        inferred = Some(match (inferred, dt) {
            (None, dt) => dt,
            (Some(a), b) if a == b => a,
            (Some(DataType::Int), DataType::Float) | (Some(DataType::Float), DataType::Int) => {
                DataType::Float
            }
            _ => return DataType::String,
        });
    }

    inferred.unwrap_or(DataType::String)
}

/// Converts `value` for a column of `data_type`, parsing text for the
/// timestamp and float targets.
pub fn coerce(value: Value, data_type: DataType) -> Value {
    match data_type {
        DataType::Timestamp => to_timestamp(value),
        DataType::Float => to_numeric(value),
        other => value.conform_to(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(y: i32, m: u32, d: u32) -> Value {
        Value::Timestamp(
            NaiveDate::from_ymd_opt(y, m, d)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        )
    }

    #[test]
    fn parses_known_date_formats() {
        assert_eq!(to_timestamp(Value::String("12-May-1961".into())), ts(1961, 5, 12));
        assert_eq!(to_timestamp(Value::String("1961-05-12".into())), ts(1961, 5, 12));
        assert_eq!(to_timestamp(Value::String("05/12/1961".into())), ts(1961, 5, 12));
        assert_eq!(to_timestamp(Value::String("May 12, 1961".into())), ts(1961, 5, 12));
        assert_eq!(
            to_timestamp(Value::String("2024-03-01T10:30:00Z".into())).as_timestamp().map(|t| t.to_string()),
            Some("2024-03-01 10:30:00".to_string())
        );
    }

    #[test]
    fn timestamp_coercion_is_total() {
        for raw in ["", "soon", "32-Jan-2020", "2020-13-01"] {
            assert_eq!(to_timestamp(Value::String(raw.into())), Value::Null, "{raw}");
        }
        assert_eq!(to_timestamp(Value::Int(19610512)), Value::Null);
        assert_eq!(to_timestamp(Value::Null), Value::Null);
    }

    #[test]
    fn numeric_strips_separators() {
        assert_eq!(to_numeric(Value::String("1,234.50".into())), Value::Float(1234.5));
        assert_eq!(to_numeric(Value::String(" 1 000 ".into())), Value::Float(1000.0));
        assert_eq!(to_numeric(Value::Int(7)), Value::Float(7.0));
        assert_eq!(to_numeric(Value::String("n/a".into())), Value::Null);
        assert_eq!(to_numeric(Value::String("inf".into())), Value::Null);
        assert_eq!(to_numeric(Value::Boolean(true)), Value::Null);
    }

    #[test]
    fn value_inference() {
        let ints = [Value::Int(1), Value::Null, Value::Int(3)];
        assert_eq!(infer_from_values(&ints), DataType::Int);

        let nums = [Value::Int(1), Value::Float(2.5)];
        assert_eq!(infer_from_values(&nums), DataType::Float);

        let mixed = [Value::Int(1), Value::String("x".into())];
        assert_eq!(infer_from_values(&mixed), DataType::String);

        assert_eq!(infer_from_values(&[Value::Null]), DataType::String);
    }
}
