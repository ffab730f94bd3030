use chrono::{DateTime, Utc};
use model::{execution::load::LoadResult, pagination::page::FetchResult};
use serde::Serialize;
use uuid::Uuid;

/// What happened to one source during a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceReport {
    pub source: String,
    pub available: bool,
    /// Total declared by the source; zero for bulk files.
    pub declared: u64,
    pub records: u64,
    pub failed_pages: Vec<u32>,
}

impl SourceReport {
    pub fn from_fetch(source: &str, result: &FetchResult) -> Self {
        SourceReport {
            source: source.to_string(),
            available: !(result.count == 0 && result.is_empty() && !result.failed_pages.is_empty()),
            declared: result.count,
            records: result.data.len() as u64,
            failed_pages: result.failed_pages.clone(),
        }
    }

    pub fn file(source: &str, available: bool) -> Self {
        SourceReport {
            source: source.to_string(),
            available,
            declared: 0,
            records: 0,
            failed_pages: Vec::new(),
        }
    }

    pub fn is_partial(&self) -> bool {
        !self.failed_pages.is_empty() || self.records < self.declared
    }
}

/// Summary of one fetch-normalize-load cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub cycle_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub sources: Vec<SourceReport>,
    pub loads: Vec<LoadResult>,
    /// Datasets produced but not written for lack of a table mapping.
    pub unmapped: Vec<String>,
    /// Sheets or datasets that failed to normalize, with the reason.
    pub transform_failures: Vec<(String, String)>,
}

impl CycleReport {
    pub fn new() -> Self {
        CycleReport {
            cycle_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            sources: Vec::new(),
            loads: Vec::new(),
            unmapped: Vec::new(),
            transform_failures: Vec::new(),
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn partial_sources(&self) -> impl Iterator<Item = &SourceReport> {
        self.sources.iter().filter(|s| s.is_partial())
    }

    pub fn failed_loads(&self) -> impl Iterator<Item = &LoadResult> {
        self.loads.iter().filter(|l| !l.success)
    }

    pub fn rows_written(&self) -> u64 {
        self.loads.iter().filter(|l| l.success).map(|l| l.rows_written).sum()
    }

    pub fn load(&self, table: &str) -> Option<&LoadResult> {
        self.loads.iter().find(|l| l.table == table)
    }

    pub fn source(&self, id: &str) -> Option<&SourceReport> {
        self.sources.iter().find(|s| s.source == id)
    }

    /// Every source complete and every load successful.
    pub fn is_clean(&self) -> bool {
        self.sources.iter().all(|s| s.available && !s.is_partial())
            && self.failed_loads().next().is_none()
            && self.transform_failures.is_empty()
    }
}

impl Default for CycleReport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::records::raw::RawRecord;

    #[test]
    fn partial_fetch_is_reported() {
        let result = FetchResult {
            count: 3,
            data: vec![RawRecord::new(), RawRecord::new()],
            failed_pages: vec![2],
        };
        let report = SourceReport::from_fetch("loan_statements", &result);
        assert!(report.available);
        assert!(report.is_partial());

        let unavailable = SourceReport::from_fetch("loan_statements", &FetchResult::unavailable(1));
        assert!(!unavailable.available);
    }

    #[test]
    fn clean_cycle() {
        let mut report = CycleReport::new();
        report.sources.push(SourceReport::file("projects", true));
        let mut load = LoadResult::new("themes", "wb_project_themes");
        load.success = true;
        load.rows_written = 4;
        report.loads.push(load);
        assert!(report.is_clean());
        assert_eq!(report.rows_written(), 4);

        report.loads.push(LoadResult::new("sectors", "wb_project_sectors").failed("boom"));
        assert!(!report.is_clean());
        assert_eq!(report.failed_loads().count(), 1);
    }
}
