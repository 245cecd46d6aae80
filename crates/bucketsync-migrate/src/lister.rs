//! Breadth-first walk of a bucket's prefix tree.

use std::collections::VecDeque;

use bucketsync_core::types::{ListEntry, ListOptions, ObjectPath};
use bucketsync_core::{Result, RetryPolicy, StorageService};

use crate::TRACING_TARGET_LISTER;

/// Enumerates every object path of a bucket.
///
/// Prefixes are kept on an explicit work queue starting with the root
/// prefix. Each prefix is listed page by page; folder entries enqueue a
/// deeper prefix and file entries become object paths. Every page request
/// runs under the retry policy, and an error that survives it aborts the
/// listing of the whole bucket.
#[derive(Debug, Clone)]
pub struct ObjectLister {
    storage: StorageService,
    retry: RetryPolicy,
    page_size: u32,
}

impl ObjectLister {
    /// Creates a lister over `storage`.
    pub fn new(storage: StorageService, retry: RetryPolicy, page_size: u32) -> Self {
        Self {
            storage,
            retry,
            page_size: page_size.max(1),
        }
    }

    /// Lists all object paths of `bucket` in traversal order.
    pub async fn list(&self, bucket: &str) -> Result<Vec<ObjectPath>> {
        let mut queue = VecDeque::from([String::new()]);
        let mut paths = Vec::new();
        let mut folders = 0usize;

        while let Some(prefix) = queue.pop_front() {
            let mut offset = 0;

            loop {
                let entries = self.page(bucket, &prefix, offset).await?;
                let received = entries.len();

                for entry in entries {
                    let path = ObjectPath::join(&prefix, entry.name());
                    match entry {
                        ListEntry::Folder { .. } => {
                            folders += 1;
                            queue.push_back(path.into_inner());
                        }
                        ListEntry::File { .. } => paths.push(path),
                    }
                }

                if received < self.page_size as usize {
                    break;
                }
                offset += self.page_size;
            }
        }

        tracing::debug!(
            target: TRACING_TARGET_LISTER,
            bucket = %bucket,
            objects = paths.len(),
            folders,
            "Bucket listing complete"
        );

        Ok(paths)
    }

    async fn page(&self, bucket: &str, prefix: &str, offset: u32) -> Result<Vec<ListEntry>> {
        let options = ListOptions::page(self.page_size).with_offset(offset);
        self.retry
            .run("list_objects", || {
                self.storage.list_objects(bucket, prefix, &options)
            })
            .await
    }
}
