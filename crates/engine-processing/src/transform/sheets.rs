use crate::{error::TransformError, transform::normalizer::Normalizer};
use connectors::file::{
    csv::reader::read_csv,
    xlsx::{
        hyperlinks::{HyperlinkMap, read_hyperlinks},
        workbook::{SheetData, read_sheet},
    },
};
use engine_config::settings::SheetSpec;
use model::{
    core::{identifiers::standardize_column_name, value::Value},
    records::dataset::Dataset,
};
use std::path::Path;
use tracing::{info, warn};

/// Suffix of the column holding a cell's hyperlink target.
pub const LINK_SUFFIX: &str = "_url";

/// Reads and normalizes one worksheet. Blocking; run it off the runtime.
pub fn normalize_sheet(path: &Path, spec: &SheetSpec, normalizer: &Normalizer) -> Result<Dataset, TransformError> {
    let mut sheet = read_sheet(path, &spec.name, &spec.skip_rows).map_err(|source| TransformError::Sheet {
        sheet: spec.name.clone(),
        source,
    })?;

    if spec.extract_links {
        match read_hyperlinks(path, &spec.name) {
            Ok(links) => attach_links(&mut sheet, &links),
            Err(e) => warn!(sheet = %spec.name, error = %e, "Could not read hyperlinks"),
        }
    }

    let dataset = normalizer.normalize(&spec.dataset_name(), sheet.table)?;
    info!(sheet = %spec.name, dataset = dataset.name(), rows = dataset.len(), "Processed sheet");
    Ok(dataset)
}

/// Reads and normalizes a CSV bulk file.
pub fn normalize_csv(path: &Path, dataset: &str, normalizer: &Normalizer) -> Result<Dataset, TransformError> {
    let table = read_csv(path, b',')?;
    let dataset = normalizer.normalize(dataset, table)?;
    info!(dataset = dataset.name(), rows = dataset.len(), "Processed CSV file");
    Ok(dataset)
}

/// Project id columns: the name holds both `project` and `id`, or is `id`.
pub fn is_link_column(standardized: &str) -> bool {
    standardized == "id" || (standardized.contains("project") && standardized.contains("id"))
}

/// Appends `<column>_url` for every project id column, with the hyperlink
/// target of each cell or null.
fn attach_links(sheet: &mut SheetData, links: &HyperlinkMap) {
    let targets: Vec<(usize, String)> = sheet
        .table
        .headers
        .iter()
        .enumerate()
        .map(|(idx, h)| (idx, standardize_column_name(h)))
        .filter(|(_, name)| is_link_column(name))
        .collect();

    for (col, name) in targets {
        let values: Vec<Value> = (0..sheet.table.len())
            .map(|row| {
                sheet
                    .cell_position(row, col)
                    .and_then(|pos| links.get(pos))
                    .map_or(Value::Null, |url| Value::String(url.to_string()))
            })
            .collect();

        let found = values.iter().filter(|v| !v.is_null()).count();
        info!(sheet = %sheet.name, column = %name, links = found, "Extracted hyperlinks");
        sheet.table.push_column(&format!("{name}{LINK_SUFFIX}"), values);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_columns() {
        assert!(is_link_column("id"));
        assert!(is_link_column("project_id"));
        assert!(is_link_column("projectid"));
        assert!(!is_link_column("credit_id"));
        assert!(!is_link_column("project_name"));
        assert!(!is_link_column("identifier"));
    }
}
