//! Options for listing and uploading objects.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

/// Default number of entries requested per listing page.
pub const DEFAULT_PAGE_SIZE: u32 = 1000;

/// Sort direction for listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[derive(AsRefStr, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SortOrder {
    /// Ascending order.
    #[default]
    Asc,
    /// Descending order.
    Desc,
}

/// Column and direction a listing is sorted by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortBy {
    /// Column to sort on.
    pub column: String,
    /// Sort direction.
    pub order: SortOrder,
}

impl Default for SortBy {
    fn default() -> Self {
        Self {
            column: "name".to_owned(),
            order: SortOrder::Asc,
        }
    }
}

/// Parameters of a single listing call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListOptions {
    /// Maximum number of entries to return.
    pub limit: u32,
    /// Number of entries to skip.
    pub offset: u32,
    /// Sort column and order.
    pub sort_by: SortBy,
    /// Optional name filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
            sort_by: SortBy::default(),
            search: None,
        }
    }
}

impl ListOptions {
    /// Creates options for a page of `limit` entries sorted by name ascending.
    pub fn page(limit: u32) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    /// Sets the offset.
    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    /// Sets the name filter.
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }
}

/// Parameters of an upload call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadOptions {
    /// Overwrite an existing object with the same path.
    pub upsert: bool,
    /// MIME type to store with the object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Cache lifetime in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_control: Option<String>,
}

impl UploadOptions {
    /// Upload options that never overwrite an existing object.
    pub fn create_only() -> Self {
        Self::default()
    }

    /// Sets the content type.
    pub fn with_content_type(mut self, content_type: Option<String>) -> Self {
        self.content_type = content_type;
        self
    }

    /// Sets the cache lifetime in seconds.
    pub fn with_cache_control(mut self, cache_control: impl Into<String>) -> Self {
        self.cache_control = Some(cache_control.into());
        self
    }
}
