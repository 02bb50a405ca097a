//! Container-level enumeration
//!
//! Walks the paged blob listing of one container, filters each entry and
//! spawns a task per surviving blob so content downloads overlap.

use crate::config::ScanOptions;
use crate::error::Result;
use crate::explorer::reset::reset_metadata;
use crate::explorer::{ScanContext, TaskGroup};
use crate::filter::matches;
use crate::report::models::Blob;
use crate::storage::BlobEntry;
use tracing::debug;

pub(crate) async fn enumerate_blobs(ctx: &ScanContext, container: &str) -> Result<Vec<Blob>> {
    let mut tasks: TaskGroup<Blob> = TaskGroup::new();
    let mut marker: Option<String> = None;

    loop {
        let current = marker.take();
        let page = tasks
            .alongside(async {
                let _permit = ctx.permit().await?;
                ctx.client.list_blobs_page(container, current).await
            })
            .await?;

        for entry in page.items {
            if !accepts(&ctx.options, &entry) {
                continue;
            }

            let task_ctx = ctx.clone();
            let container = container.to_string();
            tasks.spawn(async move { build_blob(&task_ctx, &container, entry).await });
        }

        match page.next_marker {
            Some(next) => marker = Some(next),
            None => break,
        }
    }

    tasks.finish().await
}

/// Name filter first, then the metadata group when one is configured
pub(crate) fn accepts(options: &ScanOptions, entry: &BlobEntry) -> bool {
    if !options.blob_filter.accepts(&entry.name) {
        return false;
    }

    options.metadata_filters.is_empty() || matches(&entry.metadata, &options.metadata_filters)
}

async fn build_blob(ctx: &ScanContext, container: &str, entry: BlobEntry) -> Result<Blob> {
    if let Some(reset) = &ctx.options.reset {
        reset_metadata(ctx, container, &entry, reset).await;
    }

    let content = if ctx.options.download_content {
        let _permit = ctx.permit().await?;
        let bytes = ctx.client.download_blob(container, &entry.name).await?;
        debug!("Downloaded {} bytes of {}/{}", bytes.len(), container, entry.name);
        Some(bytes)
    } else {
        None
    };

    Ok(Blob {
        name: entry.name,
        properties: entry.properties,
        metadata: entry.metadata,
        content,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{Filter, Metadata};
    use crate::report::models::BlobProperties;

    fn entry(name: &str, metadata: &[(&str, &str)]) -> BlobEntry {
        BlobEntry {
            name: name.to_string(),
            properties: BlobProperties::default(),
            metadata: metadata
                .iter()
                .map(|(k, v)| (k.to_string(), Some(v.to_string())))
                .collect::<Metadata>(),
        }
    }

    #[test]
    fn test_accepts_without_filters() {
        assert!(accepts(&ScanOptions::default(), &entry("f1.txt", &[])));
    }

    #[test]
    fn test_accepts_blob_name_substring() {
        let options = ScanOptions::default().with_blob_filter(".log");
        assert!(accepts(&options, &entry("f2.log", &[])));
        assert!(!accepts(&options, &entry("f1.txt", &[])));
    }

    #[test]
    fn test_metadata_group_requires_a_match() {
        let options =
            ScanOptions::default().with_metadata_filters(vec![Filter::new("team", "inf")]);
        assert!(accepts(&options, &entry("a", &[("team", "infra")])));
        assert!(!accepts(&options, &entry("b", &[("team", "ops")])));
        assert!(!accepts(&options, &entry("c", &[])));
    }

    #[test]
    fn test_both_filters_must_pass() {
        let options = ScanOptions::default()
            .with_blob_filter(".log")
            .with_metadata_filters(vec![Filter::new("team", "inf")]);
        assert!(!accepts(&options, &entry("a.txt", &[("team", "infra")])));
        assert!(accepts(&options, &entry("a.log", &[("team", "infra")])));
    }
}
