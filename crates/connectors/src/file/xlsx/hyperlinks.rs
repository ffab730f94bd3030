use crate::file::{error::FileError, xlsx::cell_ref::CellRange};
use quick_xml::{
    Reader,
    escape::unescape,
    events::{BytesStart, Event},
};
use std::{
    collections::HashMap,
    fs::File,
    io::{BufReader, Read},
    path::Path,
};
use tracing::debug;
use zip::{ZipArchive, result::ZipError};

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";

/// External hyperlink targets of one sheet, looked up by zero-based
/// `(row, col)` in absolute sheet coordinates.
#[derive(Debug, Clone, Default)]
pub struct HyperlinkMap {
    /// Single-cell links with their declaration order.
    cells: HashMap<(u32, u32), (usize, String)>,
    ranges: Vec<(usize, CellRange, String)>,
    declared: usize,
}

impl HyperlinkMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later declarations win over earlier ones covering the same cell.
    pub fn insert(&mut self, range: CellRange, url: String) {
        let order = self.declared;
        self.declared += 1;
        match range.single() {
            Some(cell) => {
                self.cells.insert(cell, (order, url));
            }
            None => self.ranges.push((order, range, url)),
        }
    }

    pub fn get(&self, cell: (u32, u32)) -> Option<&str> {
        let in_range = self
            .ranges
            .iter()
            .rev()
            .find(|(_, range, _)| range.contains(cell))
            .map(|(order, _, url)| (*order, url));
        let single = self.cells.get(&cell).map(|(order, url)| (*order, url));

        let url = match (single, in_range) {
            (Some(a), Some(b)) => Some(if a.0 > b.0 { a.1 } else { b.1 }),
            (a, b) => a.or(b).map(|(_, url)| url),
        };
        url.map(String::as_str)
    }

    /// Number of declared links, a range counting once.
    pub fn len(&self) -> usize {
        self.cells.len() + self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Reads the hyperlink targets behind the cells of `sheet`.
///
/// Spreadsheet readers only surface the display text of a cell, so the
/// targets are resolved from the package parts directly:
/// workbook -> sheet part -> sheet relationships. Internal links (those
/// with a `location` and no relationship) are skipped.
pub fn read_hyperlinks(path: &Path, sheet: &str) -> Result<HyperlinkMap, FileError> {
    let file = File::open(path)?;
    let mut archive = ZipArchive::new(BufReader::new(file))?;

    let workbook = read_part(&mut archive, WORKBOOK_PART)?
        .ok_or_else(|| FileError::InvalidFormat(format!("{WORKBOOK_PART} missing")))?;
    let sheet_rid = parse_sheet_ids(&workbook)?
        .into_iter()
        .find_map(|(name, rid)| (name == sheet).then_some(rid))
        .ok_or_else(|| FileError::SheetNotFound(sheet.to_string()))?;

    let workbook_rels = read_part(&mut archive, WORKBOOK_RELS_PART)?
        .ok_or_else(|| FileError::InvalidFormat(format!("{WORKBOOK_RELS_PART} missing")))?;
    let target = parse_relationships(&workbook_rels)?
        .remove(&sheet_rid)
        .ok_or_else(|| FileError::InvalidFormat(format!("no part for sheet '{sheet}'")))?;
    let sheet_part = resolve_part("xl", &target);

    let Some(sheet_xml) = read_part(&mut archive, &sheet_part)? else {
        return Err(FileError::InvalidFormat(format!("{sheet_part} missing")));
    };
    let links = parse_sheet_hyperlinks(&sheet_xml)?;
    if links.is_empty() {
        return Ok(HyperlinkMap::new());
    }

    let rels_part = sheet_rels_part(&sheet_part);
    let sheet_rels = match read_part(&mut archive, &rels_part)? {
        Some(xml) => parse_relationships(&xml)?,
        None => HashMap::new(),
    };

    let mut map = HyperlinkMap::new();
    for (reference, rid) in links {
        let Some(url) = rid.and_then(|rid| sheet_rels.get(&rid)) else {
            continue;
        };
        match CellRange::parse(&reference) {
            Some(range) => map.insert(range, url.clone()),
            None => debug!(sheet, reference = %reference, "Skipping malformed hyperlink reference"),
        }
    }

    debug!(sheet, links = map.len(), "Resolved sheet hyperlinks");
    Ok(map)
}

fn read_part<R: Read + std::io::Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Option<String>, FileError> {
    let mut entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut xml = String::new();
    entry.read_to_string(&mut xml)?;
    Ok(Some(xml))
}

/// `target` is relative to `base` unless it starts with `/`.
fn resolve_part(base: &str, target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("{base}/{target}"),
    }
}

fn sheet_rels_part(sheet_part: &str) -> String {
    match sheet_part.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None => format!("_rels/{sheet_part}.rels"),
    }
}

fn attr_value(element: &BytesStart, local_name: &[u8]) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == local_name)
        .and_then(|attr| {
            let raw = std::str::from_utf8(&attr.value).ok()?;
            unescape(raw).ok().map(|v| v.into_owned())
        })
}

/// Visits every start or empty element with the given local name.
fn for_each_element<F>(xml: &str, element: &[u8], mut visit: F) -> Result<(), FileError>
where
    F: FnMut(&BytesStart),
{
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) | Event::Empty(ref e) if e.local_name().as_ref() == element => {
                visit(e)
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

/// `(sheet name, relationship id)` pairs from `xl/workbook.xml`.
fn parse_sheet_ids(xml: &str) -> Result<Vec<(String, String)>, FileError> {
    let mut sheets = Vec::new();
    for_each_element(xml, b"sheet", |e| {
        if let (Some(name), Some(rid)) = (attr_value(e, b"name"), attr_value(e, b"id")) {
            sheets.push((name, rid));
        }
    })?;
    Ok(sheets)
}

fn parse_relationships(xml: &str) -> Result<HashMap<String, String>, FileError> {
    let mut rels = HashMap::new();
    for_each_element(xml, b"Relationship", |e| {
        if let (Some(id), Some(target)) = (attr_value(e, b"Id"), attr_value(e, b"Target")) {
            rels.insert(id, target);
        }
    })?;
    Ok(rels)
}

/// `(cell reference, relationship id)` for each `<hyperlink>` of a sheet.
fn parse_sheet_hyperlinks(xml: &str) -> Result<Vec<(String, Option<String>)>, FileError> {
    let mut links = Vec::new();
    for_each_element(xml, b"hyperlink", |e| {
        if let Some(reference) = attr_value(e, b"ref") {
            links.push((reference, attr_value(e, b"id")));
        }
    })?;
    Ok(links)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_workbook_and_relationship_parts() {
        let workbook = r#"<workbook xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
            <sheets>
                <sheet name="World Bank Projects" sheetId="1" r:id="rId1"/>
                <sheet name="Themes" sheetId="2" r:id="rId2"/>
            </sheets>
        </workbook>"#;
        let sheets = parse_sheet_ids(workbook).unwrap();
        assert_eq!(sheets[1], ("Themes".to_string(), "rId2".to_string()));

        let rels = r#"<Relationships>
            <Relationship Id="rId2" Type="worksheet" Target="worksheets/sheet2.xml"/>
        </Relationships>"#;
        let rels = parse_relationships(rels).unwrap();
        assert_eq!(rels.get("rId2").map(String::as_str), Some("worksheets/sheet2.xml"));
    }

    #[test]
    fn reads_sheet_hyperlinks() {
        let sheet = r#"<worksheet xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
            <hyperlinks>
                <hyperlink ref="A4" r:id="rId1"/>
                <hyperlink ref="B4" location="Sheet2!A1"/>
            </hyperlinks>
        </worksheet>"#;
        let links = parse_sheet_hyperlinks(sheet).unwrap();
        assert_eq!(links.len(), 2);
        assert_eq!(links[0], ("A4".to_string(), Some("rId1".to_string())));
        assert_eq!(links[1].1, None);
    }

    #[test]
    fn attribute_values_are_unescaped() {
        let rels = r#"<Relationships>
            <Relationship Id="rId1" Type="hyperlink" Target="https://example.org/p?id=P1&amp;lang=en" TargetMode="External"/>
        </Relationships>"#;
        let rels = parse_relationships(rels).unwrap();
        assert_eq!(
            rels.get("rId1").map(String::as_str),
            Some("https://example.org/p?id=P1&lang=en")
        );
    }

    #[test]
    fn ranges_resolve_per_cell() {
        let mut map = HyperlinkMap::new();
        map.insert(CellRange::parse("A1:XFD1048576").unwrap(), "https://example.org/all".into());
        map.insert(CellRange::parse("A4").unwrap(), "https://example.org/P1".into());
        map.insert(CellRange::parse("B2:B3").unwrap(), "https://example.org/B".into());

        assert_eq!(map.len(), 3);
        assert_eq!(map.get((2, 1)), Some("https://example.org/B"));
        assert_eq!(map.get((500_000, 9)), Some("https://example.org/all"));
        assert_eq!(map.get((3, 0)), Some("https://example.org/P1"));
        assert_eq!(map.get((4, 0)), Some("https://example.org/all"));
    }

    #[test]
    fn part_paths() {
        assert_eq!(resolve_part("xl", "worksheets/sheet1.xml"), "xl/worksheets/sheet1.xml");
        assert_eq!(resolve_part("xl", "/xl/worksheets/sheet1.xml"), "xl/worksheets/sheet1.xml");
        assert_eq!(
            sheet_rels_part("xl/worksheets/sheet1.xml"),
            "xl/worksheets/_rels/sheet1.xml.rels"
        );
    }
}
