//! Metadata reset pass
//!
//! Removes one metadata key from blobs created after a cut-off. Failures
//! are logged and never abort the run.

use crate::config::MetadataReset;
use crate::explorer::ScanContext;
use crate::storage::BlobEntry;
use crate::utils::datetime::parse_property_time;
use tracing::{info, warn};

impl MetadataReset {
    /// The blob was created after the cut-off and carries the key
    pub fn applies_to(&self, entry: &BlobEntry) -> bool {
        let created_after_cutoff = entry
            .properties
            .created_at
            .as_deref()
            .and_then(parse_property_time)
            .is_some_and(|created| created > self.created_after);

        created_after_cutoff && entry.metadata.contains_key(&self.key)
    }
}

pub(crate) async fn reset_metadata(
    ctx: &ScanContext,
    container: &str,
    entry: &BlobEntry,
    reset: &MetadataReset,
) {
    if !reset.applies_to(entry) {
        return;
    }

    let mut remaining = entry.metadata.clone();
    remaining.remove(&reset.key);

    let _permit = match ctx.permit().await {
        Ok(permit) => permit,
        Err(e) => {
            warn!("Skipping metadata reset of {}/{}: {}", container, entry.name, e);
            return;
        }
    };

    match ctx
        .client
        .set_blob_metadata(container, &entry.name, &remaining)
        .await
    {
        Ok(()) => info!(
            "{}/{}: removed metadata key '{}'",
            container, entry.name, reset.key
        ),
        Err(e) => warn!(
            "Failed to reset metadata of {}/{}: {}",
            container, entry.name, e
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::models::BlobProperties;
    use crate::utils::datetime::parse_iso_datetime;

    fn entry(created_at: Option<&str>, keys: &[&str]) -> BlobEntry {
        BlobEntry {
            name: "blob".to_string(),
            properties: BlobProperties {
                created_at: created_at.map(str::to_string),
                ..Default::default()
            },
            metadata: keys
                .iter()
                .map(|k| (k.to_string(), Some("1".to_string())))
                .collect(),
        }
    }

    fn reset() -> MetadataReset {
        MetadataReset {
            key: "processed".to_string(),
            created_after: parse_iso_datetime("2021-03-09T19:00:00Z").unwrap(),
        }
    }

    #[test]
    fn test_applies_after_cutoff_with_key() {
        assert!(reset().applies_to(&entry(Some("2021-03-10T00:00:00+00:00"), &["processed"])));
    }

    #[test]
    fn test_skips_before_cutoff_or_without_key() {
        assert!(!reset().applies_to(&entry(Some("2021-03-01T00:00:00+00:00"), &["processed"])));
        assert!(!reset().applies_to(&entry(Some("2021-03-10T00:00:00+00:00"), &["other"])));
        assert!(!reset().applies_to(&entry(None, &["processed"])));
    }
}
