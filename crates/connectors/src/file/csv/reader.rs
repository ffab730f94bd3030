use crate::file::error::FileError;
use csv::{ReaderBuilder, Trim};
use model::{core::value::Value, records::raw::RawTable};
use std::path::Path;
use tracing::{debug, warn};

/// Reads a delimited file with a header row into an untyped table.
/// Every field is text; empty fields are `Null`. Short rows are padded.
pub fn read_csv(path: &Path, delimiter: u8) -> Result<RawTable, FileError> {
    if !path.exists() {
        return Err(FileError::NotFound(path.display().to_string()));
    }

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_path(path)?;

    let headers = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect::<Vec<_>>();
    let width = headers.len();
    let mut table = RawTable::new(headers);
    let mut overlong = 0usize;

    for record in reader.records() {
        let record = record?;
        if record.len() > width {
            overlong += 1;
        }

        let mut row: Vec<Value> = record
            .iter()
            .take(width)
            .map(|field| {
                if field.is_empty() {
                    Value::Null
                } else {
                    Value::String(field.to_string())
                }
            })
            .collect();
        row.resize(width, Value::Null);
        table.rows.push(row);
    }

    if overlong > 0 {
        warn!(path = %path.display(), rows = overlong, "Rows wider than the header were truncated");
    }
    debug!(path = %path.display(), rows = table.len(), "Read delimited file");

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn reads_headers_and_pads_rows() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "\u{feff}GEF ID,Title,Amount").unwrap();
        writeln!(file, "10001, Coastal Resilience ,\"1,200\"").unwrap();
        writeln!(file, "10002,,").unwrap();
        writeln!(file, "10003").unwrap();

        let table = read_csv(file.path(), b',').unwrap();
        assert_eq!(table.headers, vec!["GEF ID", "Title", "Amount"]);
        assert_eq!(table.len(), 3);
        assert_eq!(table.rows[0][1], Value::String("Coastal Resilience".into()));
        assert_eq!(table.rows[0][2], Value::String("1,200".into()));
        assert_eq!(table.rows[1][1], Value::Null);
        assert_eq!(table.rows[2], vec![Value::String("10003".into()), Value::Null, Value::Null]);
    }
}
