//! Object paths and bodies.

use bytes::Bytes;
use derive_more::{Deref, Display, From};
use serde::{Deserialize, Serialize};

/// Separator used to emulate directories inside a bucket.
pub const PATH_SEPARATOR: char = '/';

/// Slash-delimited path of an object within a bucket.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(Deref, Display, From, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectPath(String);

impl ObjectPath {
    /// Wraps a full object path.
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Joins a traversal prefix with an entry name.
    ///
    /// The root prefix is the empty string, so `join("", "a.png")` is
    /// `a.png` and `join("dir1", "b.png")` is `dir1/b.png`.
    pub fn join(prefix: &str, name: &str) -> Self {
        if prefix.is_empty() {
            Self(name.to_owned())
        } else {
            Self(format!("{prefix}{PATH_SEPARATOR}{name}"))
        }
    }

    /// Splits the path at the last separator into `(prefix, name)`.
    pub fn split(&self) -> (&str, &str) {
        match self.0.rfind(PATH_SEPARATOR) {
            Some(index) => (&self.0[..index], &self.0[index + 1..]),
            None => ("", &self.0),
        }
    }

    /// Returns the prefix that contains this object.
    pub fn prefix(&self) -> &str {
        self.split().0
    }

    /// Returns the final path component.
    pub fn name(&self) -> &str {
        self.split().1
    }

    /// Returns the path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the path and returns the inner string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for ObjectPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ObjectPath {
    fn from(path: &str) -> Self {
        Self(path.to_owned())
    }
}

/// Downloaded object bytes together with their content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectBody {
    /// Raw object bytes.
    pub data: Bytes,
    /// MIME type reported by the source, if any.
    pub content_type: Option<String>,
}

impl ObjectBody {
    /// Creates a body without a content type.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            content_type: None,
        }
    }

    /// Sets the content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Returns the body size in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the body carries no bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
