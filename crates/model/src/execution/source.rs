use serde::{Deserialize, Serialize};
use std::{fmt, time::Duration};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileFormat {
    Xlsx,
    Csv,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RetrievalKind {
    PaginatedApi {
        dataset_id: String,
        resource_id: String,
    },
    BulkFile {
        file_name: String,
        format: FileFormat,
    },
}

/// Per-source retrieval parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchParams {
    pub page_size: u32,
    /// Total attempts per page (or per download), including the first.
    pub max_retries: u32,
    pub retry_delay_secs: u64,
    pub timeout_secs: u64,
}

impl Default for FetchParams {
    fn default() -> Self {
        FetchParams {
            page_size: 1000,
            max_retries: 3,
            retry_delay_secs: 5,
            timeout_secs: 30,
        }
    }
}

impl FetchParams {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Static description of one external source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    pub id: String,
    pub url: String,
    #[serde(flatten)]
    pub kind: RetrievalKind,
    pub params: FetchParams,
    /// When a mandatory source is unavailable the whole cycle is aborted.
    #[serde(default)]
    pub mandatory: bool,
}

impl SourceDescriptor {
    pub fn paginated(id: &str, base_url: &str, dataset_id: &str, resource_id: &str, params: FetchParams) -> Self {
        SourceDescriptor {
            id: id.to_string(),
            url: base_url.to_string(),
            kind: RetrievalKind::PaginatedApi {
                dataset_id: dataset_id.to_string(),
                resource_id: resource_id.to_string(),
            },
            params,
            mandatory: false,
        }
    }

    pub fn bulk(id: &str, url: &str, file_name: &str, format: FileFormat, params: FetchParams) -> Self {
        SourceDescriptor {
            id: id.to_string(),
            url: url.to_string(),
            kind: RetrievalKind::BulkFile {
                file_name: file_name.to_string(),
                format,
            },
            params,
            mandatory: false,
        }
    }

    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    pub fn is_paginated(&self) -> bool {
        matches!(self.kind, RetrievalKind::PaginatedApi { .. })
    }

    /// URL of a 1-based page. Bulk sources ignore `page` and return their URL.
    pub fn page_url(&self, page: u32) -> String {
        match &self.kind {
            RetrievalKind::PaginatedApi {
                dataset_id,
                resource_id,
            } => {
                let top = self.params.page_size;
                let skip = u64::from(page.saturating_sub(1)) * u64::from(top);
                format!(
                    "{}?datasetId={dataset_id}&resourceId={resource_id}&top={top}&type=json&skip={skip}",
                    self.url
                )
            }
            RetrievalKind::BulkFile { .. } => self.url.clone(),
        }
    }
}

impl fmt::Display for SourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            RetrievalKind::PaginatedApi {
                dataset_id,
                resource_id,
            } => write!(f, "{} (api {dataset_id}/{resource_id})", self.id),
            RetrievalKind::BulkFile { file_name, .. } => write!(f, "{} (file {file_name})", self.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_url_uses_offset() {
        let source = SourceDescriptor::paginated(
            "credit_statements",
            "https://example.org/api",
            "DS00001",
            "RS00001",
            FetchParams::default(),
        );

        assert_eq!(
            source.page_url(1),
            "https://example.org/api?datasetId=DS00001&resourceId=RS00001&top=1000&type=json&skip=0"
        );
        assert!(source.page_url(3).ends_with("&skip=2000"));
    }

    #[test]
    fn deserializes_tagged_kind() {
        let json = r#"{
            "id": "projects",
            "url": "https://example.org/all.xlsx",
            "kind": "bulk_file",
            "file_name": "world_bank_projects.xlsx",
            "format": "xlsx",
            "params": {"page_size": 1, "max_retries": 2, "retry_delay_secs": 0, "timeout_secs": 5},
            "mandatory": true
        }"#;

        let source: SourceDescriptor = serde_json::from_str(json).unwrap();
        assert!(source.mandatory);
        assert_eq!(
            source.kind,
            RetrievalKind::BulkFile {
                file_name: "world_bank_projects.xlsx".into(),
                format: FileFormat::Xlsx
            }
        );
    }
}
