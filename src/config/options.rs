//! Immutable scan options
//!
//! Built once from the parsed command line and the loaded [`Config`], then
//! shared read-only by every enumeration task.

use crate::config::Config;
use crate::filter::{Filter, NameFilter};
use chrono::{DateTime, Utc};

/// Remove a metadata key from blobs created after a point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataReset {
    pub key: String,
    pub created_after: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub container_filter: NameFilter,
    pub blob_filter: NameFilter,
    pub metadata_filters: Vec<Filter>,
    pub download_content: bool,
    pub max_concurrency: usize,
    pub sort_output: bool,
    pub reset: Option<MetadataReset>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            container_filter: NameFilter::default(),
            blob_filter: NameFilter::default(),
            metadata_filters: Vec::new(),
            download_content: false,
            max_concurrency: Config::default().max_concurrency,
            sort_output: true,
            reset: None,
        }
    }
}

impl ScanOptions {
    pub fn with_container_filter<S: Into<String>>(mut self, pattern: S) -> Self {
        self.container_filter = NameFilter::new(Some(pattern.into()));
        self
    }

    pub fn with_blob_filter<S: Into<String>>(mut self, pattern: S) -> Self {
        self.blob_filter = NameFilter::new(Some(pattern.into()));
        self
    }

    pub fn with_metadata_filters(mut self, filters: Vec<Filter>) -> Self {
        self.metadata_filters = filters;
        self
    }

    pub fn with_content(mut self, download: bool) -> Self {
        self.download_content = download;
        self
    }

    pub fn with_max_concurrency(mut self, workers: usize) -> Self {
        self.max_concurrency = workers.max(1);
        self
    }

    pub fn with_sorting(mut self, sort: bool) -> Self {
        self.sort_output = sort;
        self
    }

    pub fn with_reset(mut self, reset: MetadataReset) -> Self {
        self.reset = Some(reset);
        self
    }
}
