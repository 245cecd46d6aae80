//! Bucket information structures.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Information about a storage bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketInfo {
    /// Bucket identifier.
    pub id: String,
    /// Display name, usually equal to the identifier.
    pub name: String,
    /// Whether objects can be read without credentials.
    #[serde(default)]
    pub public: bool,
    /// Bucket creation timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
}

impl BucketInfo {
    /// Creates a new private bucket description with `name == id`.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            public: false,
            created_at: None,
        }
    }

    /// Sets the public flag.
    pub fn with_public(mut self, public: bool) -> Self {
        self.public = public;
        self
    }

    /// Sets the creation timestamp.
    pub fn with_created_at(mut self, created_at: Timestamp) -> Self {
        self.created_at = Some(created_at);
        self
    }
}

/// Request to create a bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBucket {
    /// Identifier of the bucket to create.
    pub id: String,
    /// Whether the new bucket is publicly readable.
    pub public: bool,
}

impl CreateBucket {
    /// Creates a request for a publicly readable bucket.
    pub fn public(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            public: true,
        }
    }

    /// Creates a request for a private bucket.
    pub fn private(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            public: false,
        }
    }
}
