//! Report data model
//!
//! A [`StorageAccount`] is only built once every enumeration task has
//! finished; it is the unit handed to the renderers.

use crate::filter::Metadata;
use serde::{Deserialize, Serialize};

/// Listed blob properties; absent values stay absent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobProperties {
    #[serde(rename = "Blob Type", default, skip_serializing_if = "Option::is_none")]
    pub blob_type: Option<String>,
    #[serde(rename = "Content MD5", default, skip_serializing_if = "Option::is_none")]
    pub content_md5: Option<String>,
    #[serde(rename = "Created at", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(rename = "Last modified at", default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
    #[serde(rename = "Lease Status", default, skip_serializing_if = "Option::is_none")]
    pub lease_status: Option<String>,
    #[serde(rename = "Lease State", default, skip_serializing_if = "Option::is_none")]
    pub lease_state: Option<String>,
    #[serde(rename = "Lease Duration", default, skip_serializing_if = "Option::is_none")]
    pub lease_duration: Option<String>,
}

impl BlobProperties {
    /// Present properties as (label, value) pairs in display order
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        [
            ("Blob Type", &self.blob_type),
            ("Content MD5", &self.content_md5),
            ("Created at", &self.created_at),
            ("Last modified at", &self.last_modified),
            ("Lease Status", &self.lease_status),
            ("Lease State", &self.lease_state),
            ("Lease Duration", &self.lease_duration),
        ]
        .into_iter()
        .filter_map(|(label, value)| value.as_deref().map(|v| (label, v)))
        .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blob {
    pub name: String,
    #[serde(default)]
    pub properties: BlobProperties,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "content_base64"
    )]
    pub content: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Container {
    pub name: String,
    #[serde(default)]
    pub blobs: Vec<Blob>,
}

impl Container {
    pub fn new<S: Into<String>>(name: S, blobs: Vec<Blob>) -> Self {
        Self {
            name: name.into(),
            blobs,
        }
    }
}

/// Final report of one exploration run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageAccount {
    pub name: String,
    #[serde(default)]
    pub containers: Vec<Container>,
}

impl StorageAccount {
    pub fn new<S: Into<String>>(name: S, containers: Vec<Container>) -> Self {
        Self {
            name: name.into(),
            containers,
        }
    }

    /// Sort containers by name, then blobs by name within each container
    pub fn sort(&mut self) {
        self.containers.sort_by(|a, b| a.name.cmp(&b.name));
        for container in &mut self.containers {
            container.blobs.sort_by(|a, b| a.name.cmp(&b.name));
        }
    }

    pub fn blob_count(&self) -> usize {
        self.containers.iter().map(|c| c.blobs.len()).sum()
    }

    /// Every blob with the name of the container holding it
    pub fn blobs(&self) -> impl Iterator<Item = (&str, &Blob)> {
        self.containers
            .iter()
            .flat_map(|c| c.blobs.iter().map(move |b| (c.name.as_str(), b)))
    }
}

mod content_base64 {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(content: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error> {
        match content {
            Some(bytes) => serializer.serialize_str(&STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error> {
        let encoded = Option::<String>::deserialize(deserializer)?;
        encoded
            .map(|s| STANDARD.decode(s).map_err(serde::de::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob(name: &str) -> Blob {
        Blob {
            name: name.to_string(),
            properties: BlobProperties::default(),
            metadata: Metadata::new(),
            content: None,
        }
    }

    #[test]
    fn test_sort_orders_containers_and_blobs() {
        let mut account = StorageAccount::new(
            "acct",
            vec![
                Container::new("b", vec![blob("z"), blob("a")]),
                Container::new("a", vec![]),
            ],
        );
        account.sort();
        assert_eq!(account.containers[0].name, "a");
        assert_eq!(account.containers[1].blobs[0].name, "a");
        assert_eq!(account.blob_count(), 2);
    }

    #[test]
    fn test_entries_skip_absent_properties() {
        let props = BlobProperties {
            blob_type: Some("BlockBlob".to_string()),
            lease_state: Some("Available".to_string()),
            ..Default::default()
        };
        assert_eq!(
            props.entries(),
            vec![("Blob Type", "BlockBlob"), ("Lease State", "Available")]
        );
    }

    #[test]
    fn test_content_serialized_as_base64() {
        let mut b = blob("hello.txt");
        b.content = Some(b"hi".to_vec());
        let json = serde_json::to_value(&b).unwrap();
        assert_eq!(json["content"], "aGk=");

        let parsed: Blob = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.content, Some(b"hi".to_vec()));
    }
}
