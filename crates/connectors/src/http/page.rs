use crate::http::error::SourceError;
use model::{pagination::page::Page, records::raw::RawRecord};
use serde_json::Value as JsonValue;

/// Decodes a `{ "count": n, "data": [ {...}, ... ] }` body.
///
/// A missing or null `data` field is an empty page. `count` may arrive as a
/// number or a numeric string; anything else is treated as absent.
pub fn parse_page(url: &str, body: JsonValue) -> Result<Page, SourceError> {
    let JsonValue::Object(mut object) = body else {
        return Err(SourceError::Decode {
            url: url.to_string(),
            message: "expected a JSON object".to_string(),
        });
    };

    let count = object.get("count").and_then(|c| match c {
        JsonValue::Number(n) => n.as_u64(),
        JsonValue::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    });

    let data = match object.remove("data") {
        None | Some(JsonValue::Null) => Vec::new(),
        Some(JsonValue::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                JsonValue::Object(record) => Ok(record),
                other => Err(SourceError::Decode {
                    url: url.to_string(),
                    message: format!("expected record objects in 'data', found {other}"),
                }),
            })
            .collect::<Result<Vec<RawRecord>, _>>()?,
        Some(_) => {
            return Err(SourceError::Decode {
                url: url.to_string(),
                message: "'data' is not an array".to_string(),
            });
        }
    };

    Ok(Page { count, data })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_count_and_records() {
        let page = parse_page("u", json!({"count": 1500, "data": [{"a": 1}, {"a": 2}]})).unwrap();
        assert_eq!(page.count, Some(1500));
        assert_eq!(page.data.len(), 2);
    }

    #[test]
    fn missing_data_is_empty_page() {
        let page = parse_page("u", json!({"count": "7"})).unwrap();
        assert_eq!(page.count, Some(7));
        assert!(page.is_empty());
    }

    #[test]
    fn rejects_non_object_bodies() {
        assert!(matches!(
            parse_page("u", json!([1, 2])),
            Err(SourceError::Decode { .. })
        ));
        assert!(matches!(
            parse_page("u", json!({"data": [1]})),
            Err(SourceError::Decode { .. })
        ));
    }
}
