//! JSON bodies exchanged with the storage API.

use bucketsync_core::types::{BucketInfo, ListEntry, ObjectMetadata, SortBy};
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Bucket as returned by `GET /bucket`.
#[derive(Debug, Deserialize)]
pub(crate) struct BucketRecord {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub public: bool,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl From<BucketRecord> for BucketInfo {
    fn from(record: BucketRecord) -> Self {
        let created_at = record
            .created_at
            .as_deref()
            .and_then(|s| s.parse::<Timestamp>().ok());

        Self {
            name: record.name.unwrap_or_else(|| record.id.clone()),
            id: record.id,
            public: record.public,
            created_at,
        }
    }
}

/// Body of `POST /bucket`.
#[derive(Debug, Serialize)]
pub(crate) struct CreateBucketBody<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub public: bool,
}

/// Body of `POST /object/list/{bucket}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListObjectsBody<'a> {
    pub prefix: &'a str,
    pub limit: u32,
    pub offset: u32,
    pub sort_by: &'a SortBy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<&'a str>,
}

/// Entry of a listing response.
///
/// Directories come back with a null `id`.
#[derive(Debug, Deserialize)]
pub(crate) struct ObjectRecord {
    pub name: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub metadata: Option<RecordMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RecordMetadata {
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub mimetype: Option<String>,
    #[serde(default)]
    pub cache_control: Option<String>,
}

impl From<ObjectRecord> for ListEntry {
    fn from(record: ObjectRecord) -> Self {
        match record.id {
            None => ListEntry::Folder { name: record.name },
            Some(id) => ListEntry::File {
                name: record.name,
                id,
                metadata: record.metadata.map(|m| ObjectMetadata {
                    size: m.size,
                    mimetype: m.mimetype,
                    cache_control: m.cache_control,
                }),
            },
        }
    }
}
