#![allow(dead_code)]

use crate::{memory::MemoryStore, transport::ScriptedTransport};
use engine_config::settings::{Endpoint, PipelineSettings};
use engine_core::context::pipeline::PipelineContext;
use model::{
    execution::source::{FetchParams, SourceDescriptor},
    pagination::page::page_count,
    records::raw::RawRecord,
};
use rust_xlsxwriter::{Workbook, XlsxError};
use serde_json::{Value as JsonValue, json};
use std::{path::Path, sync::Arc};

pub const PROJECTS_URL: &str = "https://test.local/projects/all.xlsx";
pub const API_URL: &str = "https://test.local/api";
pub const GEF_URL: &str = "https://test.local/gef/projects.csv";

pub const PROJECT_LINK: &str = "https://projects.worldbank.org/en/projects-operations/project-detail/";

/// Settings pointing at the scripted URLs, with no waiting anywhere.
pub fn test_settings(tmp_dir: &Path) -> PipelineSettings {
    let mut settings = PipelineSettings::default();
    settings.database_url = "memory://test".to_string();
    settings.projects_url = PROJECTS_URL.to_string();
    settings.base_url = API_URL.to_string();
    settings.endpoints = vec![
        Endpoint::new("credit_statements", "DS00975", "RS00905"),
        Endpoint::new("contract_awards", "DS00005", "RS00005"),
    ];
    settings.fetch = FetchParams {
        page_size: 2,
        max_retries: 2,
        retry_delay_secs: 0,
        timeout_secs: 1,
    };
    settings.page_pause_ms = 0;
    settings.page_pool_size = 2;
    settings.source_pool_size = 4;
    settings.fetch_interval_secs = 0;
    settings.load.retry_delay_secs = 0;
    settings.tmp_dir = tmp_dir.to_path_buf();
    settings
}

pub fn context(settings: PipelineSettings, transport: &Arc<ScriptedTransport>, store: &Arc<MemoryStore>) -> PipelineContext {
    PipelineContext::new(settings, transport.clone(), store.clone())
}

pub fn source(settings: &PipelineSettings, id: &str) -> SourceDescriptor {
    settings
        .sources()
        .into_iter()
        .find(|s| s.id == id)
        .unwrap_or_else(|| panic!("no source '{id}' in settings"))
}

pub fn record(value: JsonValue) -> RawRecord {
    match value {
        JsonValue::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

/// Scripts every page of `source` so that together they serve `records`
/// and declare `records.len()` as the total.
pub fn script_pages(transport: ScriptedTransport, source: &SourceDescriptor, records: &[RawRecord]) -> ScriptedTransport {
    let total = records.len() as u64;
    let size = source.params.page_size as usize;
    let pages = page_count(total, source.params.page_size).max(1);

    (1..=pages).fold(transport, |transport, page| {
        let start = (page as usize - 1) * size;
        let data: Vec<RawRecord> = records.iter().skip(start).take(size).cloned().collect();
        transport.with_json(&source.page_url(page), json!({ "count": total, "data": data }))
    })
}

/// `n` synthetic loan records with a running amount.
pub fn loan_records(n: usize) -> Vec<RawRecord> {
    (0..n)
        .map(|i| {
            record(json!({
                "Loan Number": format!("IBRD{i:05}"),
                "Amount (USD)": format!("{}.50", 1000 + i),
                "Country": "Kenya",
            }))
        })
        .collect()
}

pub fn credit_statement_records() -> Vec<RawRecord> {
    vec![
        record(json!({
            "End of Period": "2024-01-31T00:00:00",
            "Credit Number": "IDA12340",
            "Region": "EASTERN AND SOUTHERN AFRICA",
            "Country": " Kenya ",
            "Disbursed Amount (US$)": 1000.0,
            "Repaid to IDA (US$)": 200.0,
            "Repaid 3rd Party (US$)": 50.0,
            "Service Charge Rate": "0.75",
        })),
        record(json!({
            "End of Period": "2024-01-31T00:00:00",
            "Credit Number": "IDA12341",
            "Region": "SOUTH ASIA",
            "Country": "Nepal",
            "Disbursed Amount (US$)": "0",
            "Repaid to IDA (US$)": "0",
            "Repaid 3rd Party (US$)": 0,
            "Service Charge Rate": 0.75,
        })),
        record(json!({
            "End of Period": "2024-01-31T00:00:00",
            "Credit Number": "IDA12342",
            "Region": "SOUTH ASIA",
            "Country": "Bhutan",
            "Disbursed Amount (US$)": "2,000",
            "Repaid to IDA (US$)": "1,000",
            "Repaid 3rd Party (US$)": null,
            "Service Charge Rate": null,
        })),
    ]
}

/// Project export laid out like the real one: a banner row, the header
/// row, then a row of field codes, then data. Every other sheet has a
/// banner row above its header.
pub fn write_projects_workbook(path: &Path) -> Result<(), XlsxError> {
    let mut workbook = Workbook::new();

    let projects = workbook.add_worksheet();
    projects.set_name("World Bank Projects")?;
    projects.write_string(0, 0, "World Bank Projects & Operations, generated 2024-06-01")?;
    for (col, (label, code)) in [
        ("Id", "id"),
        ("Project Name", "project_name"),
        ("Country", "countryname"),
        ("Total Commitment", "totalcommamt"),
        ("Board Approval Date", "boardapprovaldate"),
    ]
    .into_iter()
    .enumerate()
    {
        projects.write_string(1, col as u16, label)?;
        projects.write_string(2, col as u16, code)?;
    }
    projects.write_url_with_text(3, 0, format!("{PROJECT_LINK}P000001").as_str(), "P000001")?;
    projects.write_string(3, 1, "Water Supply")?;
    projects.write_string(3, 2, "Kenya")?;
    projects.write_number(3, 3, 1_500_000.0)?;
    projects.write_string(3, 4, "2020-03-15")?;
    projects.write_url_with_text(4, 0, format!("{PROJECT_LINK}P000002").as_str(), "P000002")?;
    projects.write_string(4, 1, "Rural Roads")?;
    projects.write_string(4, 2, "Peru")?;
    projects.write_string(4, 3, "2,500")?;
    projects.write_string(4, 4, "12-May-1961")?;
    projects.write_string(5, 0, "P000003")?;
    projects.write_string(5, 1, "Schools")?;
    projects.write_string(5, 2, "Chad")?;
    projects.write_string(5, 4, "n/a")?;

    let themes = workbook.add_worksheet();
    themes.set_name("Themes")?;
    themes.write_string(0, 0, "Themes")?;
    write_rows(themes, 1, &["Project Id", "Theme", "Percent"], &[
        &["P000001", "Environment", "60"],
        &["P000001", "Health", "40"],
        &["P000002", "Transport", "100"],
    ])?;

    let sectors = workbook.add_worksheet();
    sectors.set_name("Sectors")?;
    sectors.write_string(0, 0, "Sectors")?;
    write_rows(sectors, 1, &["Project Id", "Sector", "Percent"], &[
        &["P000001", "Water Supply", "100"],
        &["P000002", "Roads and Highways", "100"],
    ])?;

    let geo = workbook.add_worksheet();
    geo.set_name("GEO Locations")?;
    geo.write_string(0, 0, "GEO Locations")?;
    write_rows(geo, 1, &["Project Id", "Place Name", "Latitude", "Longitude"], &[
        &["P000001", "Nairobi", "-1.2864", "36.8172"],
    ])?;

    let financers = workbook.add_worksheet();
    financers.set_name("Financers")?;
    financers.write_string(0, 0, "Financers")?;
    write_rows(financers, 1, &["Project Id", "Financer", "Commitment Amount"], &[
        &["P000001", "IDA Credit", "1,000,000"],
        &["P000001", "Borrower", "500,000"],
    ])?;

    workbook.save(path)
}

fn write_rows(
    sheet: &mut rust_xlsxwriter::Worksheet,
    header_row: u32,
    headers: &[&str],
    rows: &[&[&str]],
) -> Result<(), XlsxError> {
    for (col, header) in headers.iter().enumerate() {
        sheet.write_string(header_row, col as u16, *header)?;
    }
    for (r, row) in rows.iter().enumerate() {
        for (col, cell) in row.iter().enumerate() {
            sheet.write_string(header_row + 1 + r as u32, col as u16, *cell)?;
        }
    }
    Ok(())
}

pub fn write_gef_csv(path: &Path) -> std::io::Result<()> {
    std::fs::write(
        path,
        "GEF ID,Title,Country,GEF Grant (USD),Approval Date\n\
         10234,Coastal Resilience,Kenya,\"1,200,000\",2021-06-30\n\
         10235,Clean Cities,Peru,850000,2022-01-15\n",
    )
}
