//! Storage client abstraction
//!
//! The explorer only ever talks to a [`StorageClient`]: paged container
//! listing, paged blob listing, blob download and metadata replacement.
//! [`azure::AzureStorageClient`] backs it with the Azure SDK and
//! [`memory::MemoryStorageClient`] keeps everything in process.

pub mod azure;
pub mod memory;

use crate::error::Result;
use crate::filter::Metadata;
use crate::report::models::BlobProperties;
use async_trait::async_trait;

/// One page of a listing plus the marker for the next request
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_marker: Option<String>,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_marker: None,
        }
    }

    /// More pages remain after this one
    pub fn has_more(&self) -> bool {
        self.next_marker.is_some()
    }
}

/// Container as returned by the account listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerEntry {
    pub name: String,
}

/// Blob as returned by the container listing, metadata included
#[derive(Debug, Clone, PartialEq)]
pub struct BlobEntry {
    pub name: String,
    pub properties: BlobProperties,
    pub metadata: Metadata,
}

/// Operations the explorer needs from a storage account
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Name of the storage account
    fn account_name(&self) -> String;

    /// Fetch one page of containers starting at `marker`
    async fn list_containers_page(&self, marker: Option<String>) -> Result<Page<ContainerEntry>>;

    /// Fetch one page of blobs in `container` starting at `marker`
    async fn list_blobs_page(
        &self,
        container: &str,
        marker: Option<String>,
    ) -> Result<Page<BlobEntry>>;

    /// Download the full body of a blob
    async fn download_blob(&self, container: &str, blob: &str) -> Result<Vec<u8>>;

    /// Replace the user metadata of a blob
    async fn set_blob_metadata(&self, container: &str, blob: &str, metadata: &Metadata)
        -> Result<()>;
}
