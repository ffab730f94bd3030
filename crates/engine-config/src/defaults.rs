//! Built-in values for the World Bank deployment.

use crate::settings::{Endpoint, SheetSpec};
use model::execution::mapping::TableMapping;
use std::path::PathBuf;

pub const PROJECTS_URL: &str = "https://search.worldbank.org/api/v3/projects/all.xlsx";
pub const BASE_URL: &str = "https://datacatalogapi.worldbank.org/dexapps/fone/api/apiservice";

pub const PROJECTS_SOURCE_ID: &str = "projects";
pub const PROJECTS_FILE_NAME: &str = "world_bank_projects.xlsx";
pub const GEF_SOURCE_ID: &str = "gef_projects";
pub const GEF_FILE_NAME: &str = "gef_projects.csv";

pub const FETCH_INTERVAL_SECS: u64 = 604_800;
pub const PAGE_PAUSE_MS: u64 = 1_000;
pub const POOL_SIZE: usize = 10;
pub const CONCURRENT_LOADS: usize = 1;
pub const LOAD_MAX_ATTEMPTS: u32 = 3;
pub const LOAD_RETRY_DELAY_SECS: u64 = 5;
pub const LOG_LEVEL: &str = "info";

const PRIMARY_SHEET: &str = "World Bank Projects";

const ENDPOINTS: [(&str, &str, &str); 8] = [
    ("credit_statements", "DS00001", "RS00001"),
    ("trust_fund_commitments", "DS00271", "RS00236"),
    ("corporate_procurement_contract_awards", "DS00028", "RS00025"),
    ("loan_statements", "DS00047", "RS00049"),
    ("procurement_notices", "DS00979", "RS00909"),
    ("financial_intermediary_funds_contributions", "DS00977", "RS00907"),
    ("contract_awards", "DS00005", "RS00005"),
    ("net_flows_and_commitments", "DS00044", "RS00043"),
];

const SECONDARY_SHEETS: [&str; 4] = ["Themes", "Sectors", "GEO Locations", "Financers"];

pub fn endpoints() -> Vec<Endpoint> {
    ENDPOINTS
        .iter()
        .map(|(name, dataset_id, resource_id)| Endpoint::new(name, dataset_id, resource_id))
        .collect()
}

/// The primary sheet carries a timestamp row and a duplicate header row
/// (absolute rows 0 and 2); the others only the timestamp row.
pub fn sheets() -> Vec<SheetSpec> {
    let mut sheets = vec![SheetSpec::new(PRIMARY_SHEET, &[0, 2]).with_links()];
    sheets.extend(SECONDARY_SHEETS.iter().map(|name| SheetSpec::new(name, &[0])));
    sheets
}

pub fn table_mappings() -> Vec<TableMapping> {
    vec![
        TableMapping::new("world_bank_projects", "wb_projects", &["id"]),
        TableMapping::new("themes", "wb_project_themes", &[]),
        TableMapping::new("sectors", "wb_project_sectors", &[]),
        TableMapping::new("geo_locations", "wb_project_geo_locations", &[]),
        TableMapping::new("financers", "wb_project_financers", &[]),
        TableMapping::new("credit_statements", "wb_credit_statements", &[]),
        TableMapping::new("contract_awards", "wb_contract_awards", &[]),
        TableMapping::new("trust_fund_commitments", "wb_trust_fund_commitments", &[]),
        TableMapping::new(
            "corporate_procurement_contract_awards",
            "wb_corporate_procurement_contract_awards",
            &[],
        ),
        TableMapping::new("loan_statements", "wb_loan_statements", &[]),
        TableMapping::new("procurement_notices", "wb_procurement_notices", &[]),
        TableMapping::new(
            "financial_intermediary_funds_contributions",
            "wb_financial_intermediary_funds_contributions",
            &[],
        ),
        TableMapping::new("net_flows_and_commitments", "wb_net_flows_and_commitments", &[]),
        TableMapping::new(GEF_SOURCE_ID, "gef_projects", &[]),
    ]
}

pub fn tmp_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("wbetl")
}
