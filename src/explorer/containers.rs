//! Account-level enumeration
//!
//! Walks the paged container listing and starts one blob enumeration task
//! per matching container as soon as its page arrives.

use crate::error::{BlobscoutError, Result};
use crate::explorer::blobs::enumerate_blobs;
use crate::explorer::{ScanContext, TaskGroup};
use crate::report::models::Container;
use tracing::debug;

pub(crate) async fn enumerate_containers(ctx: &ScanContext) -> Result<Vec<Container>> {
    let mut tasks: TaskGroup<Container> = TaskGroup::new();
    let mut marker: Option<String> = None;

    loop {
        let current = marker.take();
        let page = tasks
            .alongside(async {
                let _permit = ctx.permit().await?;
                ctx.client.list_containers_page(current).await
            })
            .await?;
        debug!("Container page with {} entries", page.items.len());

        for entry in page.items {
            if !ctx.options.container_filter.accepts(&entry.name) {
                debug!("Skipping container {}", entry.name);
                continue;
            }

            let task_ctx = ctx.clone();
            tasks.spawn(async move {
                let blobs = enumerate_blobs(&task_ctx, &entry.name).await?;
                debug!("Container {} finished with {} blobs", entry.name, blobs.len());
                Ok::<_, BlobscoutError>(Container::new(entry.name, blobs))
            });
        }

        match page.next_marker {
            Some(next) => marker = Some(next),
            None => break,
        }
    }

    tasks.finish().await
}
