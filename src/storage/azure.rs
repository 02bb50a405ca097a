//! Azure Blob Storage implementation of [`StorageClient`]
//!
//! Listing goes through the SDK's pageable streams one page at a time. An
//! unfinished stream is parked under the marker it returned so the explorer
//! keeps control of when the next page is fetched.

use crate::error::{BlobscoutError, Result};
use crate::filter::Metadata;
use crate::report::models::BlobProperties;
use crate::storage::{BlobEntry, ContainerEntry, Page, StorageClient};
use crate::utils::datetime::format_timestamp;
use async_trait::async_trait;
use azure_core::request_options::Metadata as RequestMetadata;
use azure_core::Pageable;
use azure_storage::StorageCredentials;
use azure_storage_blobs::container::operations::ListBlobsResponse;
use azure_storage_blobs::prelude::*;
use azure_storage_blobs::service::operations::ListContainersResponse;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use futures::StreamExt;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::debug;

type ContainerStream = Pageable<ListContainersResponse, azure_core::error::Error>;
type BlobStream = Pageable<ListBlobsResponse, azure_core::error::Error>;

pub struct AzureStorageClient {
    account: String,
    service: BlobServiceClient,
    // Open listings, keyed by the marker handed out for their next page
    container_cursors: Mutex<HashMap<String, ContainerStream>>,
    blob_cursors: Mutex<HashMap<(String, String), BlobStream>>,
}

impl AzureStorageClient {
    pub fn new(account: String, credentials: StorageCredentials) -> Self {
        let service = BlobServiceClient::new(account.clone(), credentials);
        Self {
            account,
            service,
            container_cursors: Mutex::new(HashMap::new()),
            blob_cursors: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl StorageClient for AzureStorageClient {
    fn account_name(&self) -> String {
        self.account.clone()
    }

    async fn list_containers_page(&self, marker: Option<String>) -> Result<Page<ContainerEntry>> {
        let mut stream = match marker {
            None => self.service.list_containers().into_stream(),
            Some(marker) => self
                .container_cursors
                .lock()
                .await
                .remove(&marker)
                .ok_or_else(|| unknown_marker("containers", &marker))?,
        };

        let response = stream
            .next()
            .await
            .ok_or_else(|| BlobscoutError::listing("containers", "empty response stream"))?
            .map_err(|e| BlobscoutError::listing("containers", e.to_string()))?;

        debug!(
            "Listed {} containers in account {}",
            response.containers.len(),
            self.account
        );

        let next_marker = response.next_marker.map(|m| m.as_str().to_string());
        if let Some(next) = &next_marker {
            self.container_cursors
                .lock()
                .await
                .insert(next.clone(), stream);
        }

        Ok(Page {
            items: response
                .containers
                .into_iter()
                .map(|c| ContainerEntry { name: c.name })
                .collect(),
            next_marker,
        })
    }

    async fn list_blobs_page(
        &self,
        container: &str,
        marker: Option<String>,
    ) -> Result<Page<BlobEntry>> {
        let scope = format!("blobs in container '{container}'");
        let mut stream = match marker {
            None => self
                .service
                .container_client(container)
                .list_blobs()
                .include_metadata(true)
                .into_stream(),
            Some(marker) => self
                .blob_cursors
                .lock()
                .await
                .remove(&(container.to_string(), marker.clone()))
                .ok_or_else(|| unknown_marker(&scope, &marker))?,
        };

        let response = stream
            .next()
            .await
            .ok_or_else(|| BlobscoutError::listing(scope.as_str(), "empty response stream"))?
            .map_err(|e| BlobscoutError::listing(scope.as_str(), e.to_string()))?;

        let items = response
            .blobs
            .blobs()
            .map(|blob| BlobEntry {
                name: blob.name.clone(),
                properties: blob_properties(&blob.properties),
                metadata: blob
                    .metadata
                    .clone()
                    .unwrap_or_default()
                    .into_iter()
                    .map(|(k, v)| (k, Some(v)))
                    .collect(),
            })
            .collect();

        let next_marker = response.next_marker.map(|m| m.as_str().to_string());
        if let Some(next) = &next_marker {
            self.blob_cursors
                .lock()
                .await
                .insert((container.to_string(), next.clone()), stream);
        }

        Ok(Page { items, next_marker })
    }

    async fn download_blob(&self, container: &str, blob: &str) -> Result<Vec<u8>> {
        let blob_client = self.service.container_client(container).blob_client(blob);

        let properties = blob_client
            .get_properties()
            .await
            .map_err(|e| BlobscoutError::download(container, blob, e.to_string()))?;

        // get_content fails with 416 on zero-length blobs
        if properties.blob.properties.content_length == 0 {
            return Ok(Vec::new());
        }

        blob_client
            .get_content()
            .await
            .map_err(|e| BlobscoutError::download(container, blob, e.to_string()))
    }

    async fn set_blob_metadata(
        &self,
        container: &str,
        blob: &str,
        metadata: &Metadata,
    ) -> Result<()> {
        let mut request_metadata = RequestMetadata::new();
        for (key, value) in metadata {
            request_metadata.insert(key.clone(), value.clone().unwrap_or_default());
        }

        self.service
            .container_client(container)
            .blob_client(blob)
            .set_metadata()
            .metadata(request_metadata)
            .await
            .map_err(|e| {
                BlobscoutError::azure_api(format!("Failed to set metadata on '{blob}': {e}"))
            })?;

        Ok(())
    }
}

fn blob_properties(properties: &azure_storage_blobs::blob::BlobProperties) -> BlobProperties {
    BlobProperties {
        blob_type: Some(properties.blob_type.to_string()),
        content_md5: properties
            .content_md5
            .as_ref()
            .map(|md5| encode_md5(md5.as_slice())),
        created_at: Some(format_timestamp(properties.creation_time.unix_timestamp())),
        last_modified: Some(format_timestamp(properties.last_modified.unix_timestamp())),
        lease_status: properties.lease_status.as_ref().map(ToString::to_string),
        lease_state: properties.lease_state.as_ref().map(ToString::to_string),
        lease_duration: properties.lease_duration.as_ref().map(ToString::to_string),
    }
}

/// Content hashes are shown base64-encoded, as the service reports them
fn encode_md5(digest: &[u8]) -> String {
    STANDARD.encode(digest)
}

fn unknown_marker(scope: &str, marker: &str) -> BlobscoutError {
    BlobscoutError::listing(scope, format!("unknown continuation marker '{marker}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_md5_is_base64_encoded() {
        let digest = [
            0x1b, 0x2c, 0x4d, 0x5e, 0x6f, 0x70, 0x81, 0x92, 0xa3, 0xb4, 0xc5, 0xd6, 0xe7, 0xf8,
            0x09, 0x1a,
        ];
        let encoded = encode_md5(&digest);
        assert_eq!(encoded.len(), 24);
        assert_eq!(STANDARD.decode(&encoded).unwrap(), digest.to_vec());
    }

    #[test]
    fn test_unknown_marker_is_listing_error() {
        let err = unknown_marker("containers", "abc");
        assert!(matches!(err, BlobscoutError::ListingError { ref details, .. } if details.contains("abc")));
    }
}
