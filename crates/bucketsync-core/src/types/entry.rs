//! Listing entries returned for a prefix.

use serde::{Deserialize, Serialize};

/// Metadata reported for a file entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMetadata {
    /// Object size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// MIME type recorded for the object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mimetype: Option<String>,
    /// Cache-control value recorded for the object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_control: Option<String>,
}

/// A single child of a listed prefix.
///
/// Storage APIs that emulate directories report "folders" as entries
/// without a content identifier. Those become new prefixes to walk;
/// files become object paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ListEntry {
    /// A virtual directory.
    Folder {
        /// Name relative to the listed prefix.
        name: String,
    },
    /// A stored object.
    File {
        /// Name relative to the listed prefix.
        name: String,
        /// Provider-assigned content identifier.
        id: String,
        /// Optional object metadata.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        metadata: Option<ObjectMetadata>,
    },
}

impl ListEntry {
    /// Creates a folder entry.
    pub fn folder(name: impl Into<String>) -> Self {
        Self::Folder { name: name.into() }
    }

    /// Creates a file entry without metadata.
    pub fn file(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self::File {
            name: name.into(),
            id: id.into(),
            metadata: None,
        }
    }

    /// Returns the entry name relative to its prefix.
    pub fn name(&self) -> &str {
        match self {
            Self::Folder { name } | Self::File { name, .. } => name,
        }
    }

    /// Returns true for folder entries.
    pub fn is_folder(&self) -> bool {
        matches!(self, Self::Folder { .. })
    }

    /// Returns true for file entries.
    pub fn is_file(&self) -> bool {
        matches!(self, Self::File { .. })
    }
}
