//! Destination existence check.

use bucketsync_core::types::{ListOptions, ObjectPath};
use bucketsync_core::{Result, RetryPolicy, StorageService};

/// Answers whether an object name is already present in a prefix.
///
/// Matching is by exact file name within the prefix only; size and content
/// are not compared.
#[derive(Debug, Clone)]
pub struct ExistenceChecker {
    storage: StorageService,
    retry: RetryPolicy,
    page_size: u32,
}

impl ExistenceChecker {
    /// Creates a checker over `storage`.
    pub fn new(storage: StorageService, retry: RetryPolicy, page_size: u32) -> Self {
        Self {
            storage,
            retry,
            page_size: page_size.max(1),
        }
    }

    /// Returns true if `bucket` holds a file at `path`.
    pub async fn exists(&self, bucket: &str, path: &ObjectPath) -> Result<bool> {
        let (prefix, name) = path.split();
        let mut offset = 0;

        loop {
            let options = ListOptions::page(self.page_size)
                .with_offset(offset)
                .with_search(name);
            let entries = self
                .retry
                .run("list_objects", || {
                    self.storage.list_objects(bucket, prefix, &options)
                })
                .await?;

            if entries.iter().any(|e| e.is_file() && e.name() == name) {
                return Ok(true);
            }
            if entries.len() < self.page_size as usize {
                return Ok(false);
            }
            offset += self.page_size;
        }
    }
}
