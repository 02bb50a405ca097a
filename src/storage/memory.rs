//! In-process storage account
//!
//! Serves listings in fixed-size pages and records every call, which makes
//! it useful for exercising the explorer without network access.

use crate::error::{BlobscoutError, Result};
use crate::filter::Metadata;
use crate::report::models::BlobProperties;
use crate::storage::{BlobEntry, ContainerEntry, Page, StorageClient};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone)]
struct StoredBlob {
    entry: BlobEntry,
    content: Vec<u8>,
}

#[derive(Debug, Default)]
struct CallStats {
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    container_pages: AtomicUsize,
    blob_pages: AtomicUsize,
    downloads: AtomicUsize,
}

pub struct MemoryStorageClient {
    account: String,
    containers: BTreeMap<String, Vec<StoredBlob>>,
    page_size: usize,
    latency: Option<Duration>,
    failing_downloads: HashSet<String>,
    failing_listings: HashSet<String>,
    stats: CallStats,
    metadata_writes: Mutex<HashMap<(String, String), Metadata>>,
}

impl MemoryStorageClient {
    pub fn new<S: Into<String>>(account: S) -> Self {
        Self {
            account: account.into(),
            containers: BTreeMap::new(),
            page_size: 5000,
            latency: None,
            failing_downloads: HashSet::new(),
            failing_listings: HashSet::new(),
            stats: CallStats::default(),
            metadata_writes: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_container<S: Into<String>>(mut self, name: S) -> Self {
        self.containers.entry(name.into()).or_default();
        self
    }

    pub fn with_blob(
        mut self,
        container: &str,
        name: &str,
        metadata: &[(&str, &str)],
        content: &[u8],
    ) -> Self {
        let entry = BlobEntry {
            name: name.to_string(),
            properties: BlobProperties {
                blob_type: Some("BlockBlob".to_string()),
                lease_status: Some("unlocked".to_string()),
                lease_state: Some("available".to_string()),
                ..Default::default()
            },
            metadata: metadata
                .iter()
                .map(|(k, v)| (k.to_string(), Some(v.to_string())))
                .collect(),
        };
        self.containers
            .entry(container.to_string())
            .or_default()
            .push(StoredBlob {
                entry,
                content: content.to_vec(),
            });
        self
    }

    /// Add a fully specified listing entry
    pub fn with_entry(mut self, container: &str, entry: BlobEntry, content: &[u8]) -> Self {
        self.containers
            .entry(container.to_string())
            .or_default()
            .push(StoredBlob {
                entry,
                content: content.to_vec(),
            });
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Base latency per call; each call adds a name-dependent jitter on top
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn fail_download(mut self, blob: &str) -> Self {
        self.failing_downloads.insert(blob.to_string());
        self
    }

    pub fn fail_listing(mut self, container: &str) -> Self {
        self.failing_listings.insert(container.to_string());
        self
    }

    /// Highest number of calls observed running at once
    pub fn peak_in_flight(&self) -> usize {
        self.stats.peak_in_flight.load(Ordering::SeqCst)
    }

    pub fn container_pages_served(&self) -> usize {
        self.stats.container_pages.load(Ordering::SeqCst)
    }

    pub fn blob_pages_served(&self) -> usize {
        self.stats.blob_pages.load(Ordering::SeqCst)
    }

    pub fn downloads_served(&self) -> usize {
        self.stats.downloads.load(Ordering::SeqCst)
    }

    /// Metadata written for a blob, if any
    pub fn written_metadata(&self, container: &str, blob: &str) -> Option<Metadata> {
        self.metadata_writes
            .lock()
            .ok()?
            .get(&(container.to_string(), blob.to_string()))
            .cloned()
    }

    async fn enter(&self, key: &str) -> InFlight<'_> {
        let now = self.stats.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(base) = self.latency {
            let jitter = key.bytes().map(u64::from).sum::<u64>() % 7;
            tokio::time::sleep(base + Duration::from_millis(jitter)).await;
        }

        InFlight(&self.stats.in_flight)
    }

    fn page<T: Clone>(&self, items: &[T], marker: Option<String>) -> Result<Page<T>> {
        let start = match marker {
            Some(m) => m
                .parse::<usize>()
                .map_err(|_| BlobscoutError::invalid_argument(format!("Unknown marker '{m}'")))?,
            None => 0,
        };
        let end = start.saturating_add(self.page_size).min(items.len());
        let next_marker = (end < items.len()).then(|| end.to_string());

        Ok(Page {
            items: items.get(start..end).unwrap_or_default().to_vec(),
            next_marker,
        })
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl StorageClient for MemoryStorageClient {
    fn account_name(&self) -> String {
        self.account.clone()
    }

    async fn list_containers_page(&self, marker: Option<String>) -> Result<Page<ContainerEntry>> {
        let _guard = self.enter("containers").await;
        self.stats.container_pages.fetch_add(1, Ordering::SeqCst);

        let names: Vec<ContainerEntry> = self
            .containers
            .keys()
            .map(|name| ContainerEntry { name: name.clone() })
            .collect();
        self.page(&names, marker)
    }

    async fn list_blobs_page(
        &self,
        container: &str,
        marker: Option<String>,
    ) -> Result<Page<BlobEntry>> {
        let _guard = self.enter(container).await;
        self.stats.blob_pages.fetch_add(1, Ordering::SeqCst);

        if self.failing_listings.contains(container) {
            return Err(BlobscoutError::listing(
                format!("blobs in container '{container}'"),
                "simulated listing failure",
            ));
        }

        let blobs = self.containers.get(container).ok_or_else(|| {
            BlobscoutError::listing(
                format!("blobs in container '{container}'"),
                "container does not exist",
            )
        })?;
        let entries: Vec<BlobEntry> = blobs.iter().map(|b| b.entry.clone()).collect();
        self.page(&entries, marker)
    }

    async fn download_blob(&self, container: &str, blob: &str) -> Result<Vec<u8>> {
        let _guard = self.enter(blob).await;
        self.stats.downloads.fetch_add(1, Ordering::SeqCst);

        if self.failing_downloads.contains(blob) {
            return Err(BlobscoutError::download(
                container,
                blob,
                "simulated download failure",
            ));
        }

        self.containers
            .get(container)
            .and_then(|blobs| blobs.iter().find(|b| b.entry.name == blob))
            .map(|b| b.content.clone())
            .ok_or_else(|| BlobscoutError::download(container, blob, "blob does not exist"))
    }

    async fn set_blob_metadata(
        &self,
        container: &str,
        blob: &str,
        metadata: &Metadata,
    ) -> Result<()> {
        let _guard = self.enter(blob).await;

        let mut writes = self
            .metadata_writes
            .lock()
            .map_err(|_| BlobscoutError::azure_api("metadata store poisoned"))?;
        writes.insert((container.to_string(), blob.to_string()), metadata.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pages_follow_markers() {
        let client = MemoryStorageClient::new("acct")
            .with_container("a")
            .with_container("b")
            .with_container("c")
            .with_page_size(2);

        let first = client.list_containers_page(None).await.unwrap();
        assert_eq!(first.items.len(), 2);
        assert!(first.has_more());

        let second = client
            .list_containers_page(first.next_marker)
            .await
            .unwrap();
        assert_eq!(second.items, vec![ContainerEntry { name: "c".into() }]);
        assert!(!second.has_more());
    }

    #[tokio::test]
    async fn test_marker_past_the_end_yields_empty_last_page() {
        let client = MemoryStorageClient::new("acct").with_container("a");

        let page = client
            .list_containers_page(Some(usize::MAX.to_string()))
            .await
            .unwrap();
        assert!(page.items.is_empty());
        assert!(!page.has_more());
    }

    #[tokio::test]
    async fn test_unknown_container_is_a_listing_error() {
        let client = MemoryStorageClient::new("acct");
        let err = client.list_blobs_page("missing", None).await.unwrap_err();
        assert!(matches!(err, BlobscoutError::ListingError { .. }));
    }
}
