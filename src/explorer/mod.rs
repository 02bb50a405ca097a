//! Concurrent account traversal
//!
//! The [`Explorer`] fans out one task per matching container and, inside
//! each container, one task per matching blob. Every storage call holds a
//! permit from a shared semaphore for its duration only, so nested fan-out
//! stays bounded without deadlocking. A failing task is noticed while its
//! level is still listing, and returning drops the [`TaskGroup`], which
//! aborts its siblings.

pub mod blobs;
pub mod containers;
pub mod reset;

use crate::config::ScanOptions;
use crate::error::{BlobscoutError, Result};
use crate::report::models::StorageAccount;
use crate::storage::StorageClient;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Semaphore, SemaphorePermit};
use tokio::task::JoinSet;
use tracing::info;

/// Shared state handed to every enumeration task
#[derive(Clone)]
pub(crate) struct ScanContext {
    pub(crate) client: Arc<dyn StorageClient>,
    pub(crate) options: Arc<ScanOptions>,
    limiter: Arc<Semaphore>,
}

impl ScanContext {
    /// Wait for a slot before issuing a storage call
    pub(crate) async fn permit(&self) -> Result<SemaphorePermit<'_>> {
        self.limiter
            .acquire()
            .await
            .map_err(|_| BlobscoutError::TaskFailed("concurrency limiter closed".to_string()))
    }
}

/// Drives a full exploration run and builds the report
pub struct Explorer {
    context: ScanContext,
}

impl Explorer {
    pub fn new(client: Arc<dyn StorageClient>, options: ScanOptions) -> Self {
        let limiter = Arc::new(Semaphore::new(options.max_concurrency.max(1)));
        Self {
            context: ScanContext {
                client,
                options: Arc::new(options),
                limiter,
            },
        }
    }

    pub fn options(&self) -> &ScanOptions {
        &self.context.options
    }

    /// Enumerate the account and wait for every task before reporting
    pub async fn run(&self) -> Result<StorageAccount> {
        let account_name = self.context.client.account_name();
        info!("Exploring storage account {}", account_name);

        let containers = containers::enumerate_containers(&self.context).await?;
        let mut account = StorageAccount::new(account_name, containers);

        if self.context.options.sort_output {
            account.sort();
        }

        info!(
            "Found {} containers and {} blobs",
            account.containers.len(),
            account.blob_count()
        );

        Ok(account)
    }
}

/// Tasks spawned by one enumeration level
///
/// Finished tasks are collected while the level is still fetching pages, so
/// the first failure returns immediately. Dropping the group aborts every
/// task still running.
pub(crate) struct TaskGroup<T> {
    tasks: JoinSet<Result<T>>,
    finished: Vec<T>,
}

impl<T: Send + 'static> TaskGroup<T> {
    pub(crate) fn new() -> Self {
        Self {
            tasks: JoinSet::new(),
            finished: Vec::new(),
        }
    }

    pub(crate) fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = Result<T>> + Send + 'static,
    {
        self.tasks.spawn(task);
    }

    /// Await `work` while collecting finished tasks; a failed task wins
    pub(crate) async fn alongside<R, F>(&mut self, work: F) -> Result<R>
    where
        F: Future<Output = Result<R>>,
    {
        tokio::pin!(work);
        loop {
            tokio::select! {
                biased;
                Some(joined) = self.tasks.join_next(), if !self.tasks.is_empty() => {
                    self.finished.push(joined??);
                }
                result = &mut work => return result,
            }
        }
    }

    /// Wait for the remaining tasks; the first error aborts the rest
    pub(crate) async fn finish(mut self) -> Result<Vec<T>> {
        while let Some(joined) = self.tasks.join_next().await {
            self.finished.push(joined??);
        }
        Ok(self.finished)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Metadata;
    use crate::report::models::BlobProperties;
    use crate::storage::{BlobEntry, ContainerEntry, MockStorageClient, Page};
    use mockall::predicate::eq;

    fn entry(name: &str) -> BlobEntry {
        BlobEntry {
            name: name.to_string(),
            properties: BlobProperties::default(),
            metadata: Metadata::new(),
        }
    }

    fn containers(names: &[&str]) -> Vec<ContainerEntry> {
        names
            .iter()
            .map(|n| ContainerEntry {
                name: n.to_string(),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_follows_container_markers_until_exhausted() {
        let mut mock = MockStorageClient::new();
        mock.expect_account_name().return_const("acct".to_string());
        mock.expect_list_containers_page()
            .with(eq(None::<String>))
            .times(1)
            .returning(|_| {
                Ok(Page {
                    items: containers(&["a"]),
                    next_marker: Some("m1".to_string()),
                })
            });
        mock.expect_list_containers_page()
            .with(eq(Some("m1".to_string())))
            .times(1)
            .returning(|_| Ok(Page::last(containers(&["b"]))));
        mock.expect_list_blobs_page()
            .times(2)
            .returning(|_, _| Ok(Page::last(vec![entry("x")])));

        let explorer = Explorer::new(Arc::new(mock), ScanOptions::default());
        let account = explorer.run().await.unwrap();

        let names: Vec<_> = account.containers.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(account.blob_count(), 2);
    }

    #[tokio::test]
    async fn test_container_listing_error_is_fatal() {
        let mut mock = MockStorageClient::new();
        mock.expect_account_name().return_const("acct".to_string());
        mock.expect_list_containers_page()
            .returning(|_| Err(BlobscoutError::listing("containers", "HTTP 403")));

        let explorer = Explorer::new(Arc::new(mock), ScanOptions::default());
        let err = explorer.run().await.unwrap_err();
        assert!(matches!(err, BlobscoutError::ListingError { .. }));
    }

    #[tokio::test]
    async fn test_download_error_aborts_run() {
        let mut mock = MockStorageClient::new();
        mock.expect_account_name().return_const("acct".to_string());
        mock.expect_list_containers_page()
            .returning(|_| Ok(Page::last(containers(&["data"]))));
        mock.expect_list_blobs_page()
            .returning(|_, _| Ok(Page::last(vec![entry("broken.bin")])));
        mock.expect_download_blob()
            .returning(|c, b| Err(BlobscoutError::download(c, b, "connection reset")));

        let explorer = Explorer::new(Arc::new(mock), ScanOptions::default().with_content(true));
        let err = explorer.run().await.unwrap_err();
        assert!(matches!(err, BlobscoutError::DownloadError { ref blob, .. } if blob == "broken.bin"));
    }

    #[tokio::test]
    async fn test_filtered_out_containers_are_never_listed() {
        let mut mock = MockStorageClient::new();
        mock.expect_account_name().return_const("acct".to_string());
        mock.expect_list_containers_page()
            .returning(|_| Ok(Page::last(containers(&["logs", "images"]))));
        mock.expect_list_blobs_page()
            .withf(|container, marker| container == "logs" && marker.is_none())
            .times(1)
            .returning(|_, _| Ok(Page::last(Vec::new())));

        let options = ScanOptions::default().with_container_filter("log");
        let account = Explorer::new(Arc::new(mock), options).run().await.unwrap();
        assert_eq!(account.containers.len(), 1);
        assert!(account.containers[0].blobs.is_empty());
    }
}
