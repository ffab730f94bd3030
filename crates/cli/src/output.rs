use crate::error::CliError;
use engine_runtime::execution::{report::CycleReport, tables::TableStatus};
use serde::Serialize;

fn to_json<T: Serialize>(value: &T) -> Result<String, CliError> {
    let json = serde_json::to_string_pretty(value)?;
    Ok(json)
}

pub async fn write_json<T: Serialize>(value: &T, path: &str) -> Result<(), CliError> {
    let json = to_json(value)?;
    tokio::fs::write(path, json).await?;
    Ok(())
}

pub fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", to_json(value)?);
    Ok(())
}

pub fn print_table_status(statuses: &[TableStatus]) {
    println!("{:<28} {:<36} {:<8} {}", "Dataset", "Table", "Exists", "Rows");
    println!("{}", "-".repeat(84));
    for status in statuses {
        let rows = status
            .rows
            .map(|r| r.to_string())
            .unwrap_or_else(|| "n/a".to_string());
        let exists = if status.exists { "yes" } else { "no" };
        println!("{:<28} {:<36} {:<8} {}", status.dataset, status.table, exists, rows);
    }
}

pub fn print_cycle_summary(report: &CycleReport) {
    println!("Cycle {}", report.cycle_id);
    println!("-----------------------------");
    for load in &report.loads {
        let outcome = match (&load.error, load.success) {
            (_, true) => format!("{} rows", load.rows_written),
            (Some(e), false) => format!("failed: {e}"),
            (None, false) => "failed".to_string(),
        };
        println!("{:<36} {}", load.table, outcome);
    }
    for source in report.partial_sources() {
        println!(
            "{:<36} partial: {}/{} records, failed pages {:?}",
            source.source, source.records, source.declared, source.failed_pages
        );
    }
    for dataset in &report.unmapped {
        println!("{dataset:<36} skipped: no table mapping");
    }
}
