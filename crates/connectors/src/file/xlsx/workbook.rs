use crate::file::error::FileError;
use calamine::{Data, Reader, Xlsx, open_workbook};
use chrono::NaiveDateTime;
use model::{core::value::Value, records::raw::RawTable};
use std::{collections::HashSet, fs::File, io::BufReader, path::Path};
use tracing::debug;

/// One sheet read into memory.
///
/// `row_positions[i]` is the absolute zero-based sheet row of
/// `table.rows[i]` and `first_col` the absolute column of the first header
/// cell, so callers can line cells up with [`super::hyperlinks`].
#[derive(Debug, Clone, Default)]
pub struct SheetData {
    pub name: String,
    pub table: RawTable,
    pub row_positions: Vec<u32>,
    pub first_col: u32,
}

impl SheetData {
    pub fn cell_position(&self, row: usize, col: usize) -> Option<(u32, u32)> {
        self.row_positions
            .get(row)
            .map(|r| (*r, self.first_col + col as u32))
    }
}

/// Reads `sheet`, dropping the absolute rows in `skip_rows` before taking
/// the first remaining row as the header. Fully blank rows are dropped.
pub fn read_sheet(path: &Path, sheet: &str, skip_rows: &[u32]) -> Result<SheetData, FileError> {
    let mut workbook = open(path)?;
    if !workbook.sheet_names().iter().any(|s| s == sheet) {
        return Err(FileError::SheetNotFound(sheet.to_string()));
    }

    let range = workbook.worksheet_range(sheet)?;
    let Some((start_row, start_col)) = range.start() else {
        return Ok(SheetData {
            name: sheet.to_string(),
            ..Default::default()
        });
    };

    let skip: HashSet<u32> = skip_rows.iter().copied().collect();
    let mut rows = range
        .rows()
        .enumerate()
        .map(|(idx, cells)| (start_row + idx as u32, cells))
        .filter(|(pos, _)| !skip.contains(pos));

    let Some((_, header_cells)) = rows.next() else {
        return Ok(SheetData {
            name: sheet.to_string(),
            first_col: start_col,
            ..Default::default()
        });
    };

    let headers = header_cells
        .iter()
        .map(|c| cell_to_value(c).as_string().unwrap_or_default())
        .collect::<Vec<_>>();
    let mut table = RawTable::new(headers);
    let mut row_positions = Vec::new();

    for (pos, cells) in rows {
        let values: Vec<Value> = cells.iter().map(cell_to_value).collect();
        if values.iter().all(Value::is_null) {
            continue;
        }
        table.rows.push(values);
        row_positions.push(pos);
    }

    debug!(sheet, rows = table.len(), columns = table.headers.len(), "Read sheet");

    Ok(SheetData {
        name: sheet.to_string(),
        table,
        row_positions,
        first_col: start_col,
    })
}

fn open(path: &Path) -> Result<Xlsx<BufReader<File>>, FileError> {
    if !path.exists() {
        return Err(FileError::NotFound(path.display().to_string()));
    }
    Ok(open_workbook(path)?)
}

pub fn cell_to_value(cell: &Data) -> Value {
    match cell {
        Data::Int(i) => Value::Int(*i),
        Data::Float(f) if f.is_finite() => Value::Float(*f),
        Data::Float(_) => Value::Null,
        Data::String(s) if s.trim().is_empty() => Value::Null,
        Data::String(s) => Value::String(s.clone()),
        Data::Bool(b) => Value::Boolean(*b),
        Data::DateTime(dt) => dt.as_datetime().map_or(Value::Null, Value::Timestamp),
        Data::DateTimeIso(s) => s
            .parse::<NaiveDateTime>()
            .map_or_else(|_| Value::String(s.clone()), Value::Timestamp),
        Data::DurationIso(s) => Value::String(s.clone()),
        Data::Error(_) | Data::Empty => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;
    use tempfile::tempdir;

    #[test]
    fn skips_configured_rows_before_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("projects.xlsx");

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name("World Bank Projects").unwrap();
        sheet.write_string(0, 0, "Generated 2024-01-01").unwrap();
        sheet.write_string(1, 0, "Project Id").unwrap();
        sheet.write_string(1, 1, "Total Amount").unwrap();
        sheet.write_string(2, 0, "id").unwrap();
        sheet.write_string(2, 1, "totalamt").unwrap();
        sheet.write_string(3, 0, "P000001").unwrap();
        sheet.write_number(3, 1, 1500.0).unwrap();
        sheet.write_string(5, 0, "P000002").unwrap();
        workbook.save(&path).unwrap();

        let data = read_sheet(&path, "World Bank Projects", &[0, 2]).unwrap();
        assert_eq!(data.table.headers, vec!["Project Id", "Total Amount"]);
        assert_eq!(data.table.len(), 2);
        assert_eq!(data.row_positions, vec![3, 5]);
        assert_eq!(data.table.rows[0][1], Value::Float(1500.0));
        assert_eq!(data.table.rows[1][1], Value::Null);
    }

    #[test]
    fn missing_sheet_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.xlsx");
        let mut workbook = Workbook::new();
        workbook.add_worksheet().set_name("Themes").unwrap();
        workbook.save(&path).unwrap();

        assert!(matches!(
            read_sheet(&path, "Sectors", &[0]),
            Err(FileError::SheetNotFound(_))
        ));
    }
}
