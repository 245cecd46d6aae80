//! In-memory storage provider for testing.
//!
//! [`MemoryStorage`] keeps buckets and objects in memory and emulates the
//! folder semantics of prefix-based storage APIs: listing a prefix returns
//! its direct files plus one folder entry per nested directory. Every call
//! is recorded so tests can assert which primitives ran, and [`Fault`]s can
//! be scripted to fail specific calls.
//!
//! # Feature Flag
//!
//! This module is only available when the `test-utils` feature is enabled:
//!
//! ```toml
//! [dev-dependencies]
//! bucketsync-core = { version = "...", features = ["test-utils"] }
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use bucketsync_core::mock::{Fault, MemoryStorage, Operation};
//!
//! let source = MemoryStorage::new()
//!     .with_object("avatars", "a.png", b"png".as_slice(), Some("image/png"))
//!     .with_object("avatars", "dir1/b.png", b"png".as_slice(), None);
//! source.inject(Fault::new(Operation::ListObjects, ErrorKind::NetworkError).times(2));
//!
//! let service = source.clone().into_service("source");
//! ```

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use strum::{AsRefStr, Display};

use crate::provider::StorageProvider;
use crate::service::StorageService;
use crate::types::{
    BucketInfo, CreateBucket, ListEntry, ListOptions, ObjectBody, ObjectMetadata, SortOrder,
    UploadOptions,
};
use crate::{Error, ErrorKind, Result};

/// Storage primitives recorded by [`MemoryStorage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Operation {
    /// [`StorageProvider::list_buckets`].
    ListBuckets,
    /// [`StorageProvider::create_bucket`].
    CreateBucket,
    /// [`StorageProvider::list_objects`].
    ListObjects,
    /// [`StorageProvider::download`].
    Download,
    /// [`StorageProvider::upload`].
    Upload,
}

impl Operation {
    /// Returns true for operations that change stored state.
    pub fn is_mutating(&self) -> bool {
        matches!(self, Self::CreateBucket | Self::Upload)
    }
}

/// A recorded provider call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    /// Primitive that was invoked.
    pub operation: Operation,
    /// Bucket argument, if any.
    pub bucket: Option<String>,
    /// Path or prefix argument, if any.
    pub target: Option<String>,
}

/// Scripted failure for a provider call.
#[derive(Debug, Clone)]
pub struct Fault {
    operation: Operation,
    bucket: Option<String>,
    target: Option<String>,
    remaining: Option<u32>,
    kind: ErrorKind,
    message: Option<String>,
}

impl Fault {
    /// Fails every matching call of `operation` with `kind`.
    pub fn new(operation: Operation, kind: ErrorKind) -> Self {
        Self {
            operation,
            bucket: None,
            target: None,
            remaining: None,
            kind,
            message: None,
        }
    }

    /// Restricts the fault to calls on `bucket`.
    pub fn in_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }

    /// Restricts the fault to calls on a path (download/upload), a prefix
    /// (listing) or a bucket id (bucket creation).
    pub fn on(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Limits the fault to the next `times` matching calls.
    pub fn times(mut self, times: u32) -> Self {
        self.remaining = Some(times);
        self
    }

    /// Sets the error message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    fn matches(&self, call: &Call) -> bool {
        self.operation == call.operation
            && self.remaining != Some(0)
            && self
                .bucket
                .as_ref()
                .is_none_or(|b| call.bucket.as_ref() == Some(b))
            && self
                .target
                .as_ref()
                .is_none_or(|t| call.target.as_ref() == Some(t))
    }

    fn to_error(&self) -> Error {
        let error = Error::new(self.kind);
        match &self.message {
            Some(message) => error.with_message(message.clone()),
            None => error.with_message(format!("injected {} failure", self.operation)),
        }
    }
}

/// An object held by [`MemoryStorage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Content identifier.
    pub id: String,
    /// Object bytes.
    pub data: Bytes,
    /// MIME type.
    pub content_type: Option<String>,
    /// Cache-control value used on upload.
    pub cache_control: Option<String>,
}

#[derive(Debug, Default)]
struct BucketState {
    public: bool,
    objects: BTreeMap<String, StoredObject>,
}

#[derive(Debug, Default)]
struct State {
    buckets: BTreeMap<String, BucketState>,
    calls: Vec<Call>,
    faults: Vec<Fault>,
    next_id: u64,
}

impl State {
    fn record(&mut self, call: Call) -> Result<()> {
        let fault = self.faults.iter_mut().find(|f| f.matches(&call));
        let outcome = match fault {
            Some(fault) => {
                if let Some(remaining) = fault.remaining.as_mut() {
                    *remaining -= 1;
                }
                Err(fault.to_error())
            }
            None => Ok(()),
        };
        self.calls.push(call);
        outcome
    }

    fn insert(
        &mut self,
        bucket: &str,
        path: &str,
        body: ObjectBody,
        cache_control: Option<String>,
    ) {
        self.next_id += 1;
        let object = StoredObject {
            id: format!("obj-{:08}", self.next_id),
            data: body.data,
            content_type: body.content_type,
            cache_control,
        };
        self.buckets
            .entry(bucket.to_owned())
            .or_default()
            .objects
            .insert(path.to_owned(), object);
    }

    fn bucket(&self, bucket: &str) -> Result<&BucketState> {
        self.buckets.get(bucket).ok_or_else(|| {
            Error::not_found().with_message(format!("Bucket not found: {bucket}"))
        })
    }
}

/// In-memory [`StorageProvider`] with call recording and fault injection.
///
/// Clones share the same state, so a test can keep one handle for
/// assertions while the pipeline owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    state: Arc<Mutex<State>>,
}

impl MemoryStorage {
    /// Creates an empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds an empty private bucket.
    pub fn with_bucket(self, bucket: &str) -> Self {
        self.lock().buckets.entry(bucket.to_owned()).or_default();
        self
    }

    /// Adds an object, creating its bucket if needed.
    pub fn with_object(
        self,
        bucket: &str,
        path: &str,
        data: impl Into<Bytes>,
        content_type: Option<&str>,
    ) -> Self {
        let mut body = ObjectBody::new(data);
        body.content_type = content_type.map(str::to_owned);
        self.lock().insert(bucket, path, body, None);
        self
    }

    /// Wraps a clone of this storage into a [`StorageService`].
    pub fn into_service(self, label: &'static str) -> StorageService {
        StorageService::new(self, label)
    }

    /// Registers a scripted failure.
    pub fn inject(&self, fault: Fault) {
        self.lock().faults.push(fault);
    }

    /// Returns all recorded calls in order.
    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    /// Returns the number of recorded calls of `operation`.
    pub fn count(&self, operation: Operation) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }

    /// Returns the targets of recorded calls of `operation`.
    pub fn targets(&self, operation: Operation) -> Vec<String> {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.operation == operation)
            .filter_map(|c| c.target.clone())
            .collect()
    }

    /// Clears the call log.
    pub fn reset_calls(&self) {
        self.lock().calls.clear();
    }

    /// Returns true if the bucket exists.
    pub fn has_bucket(&self, bucket: &str) -> bool {
        self.lock().buckets.contains_key(bucket)
    }

    /// Returns whether the bucket is public, if it exists.
    pub fn is_public(&self, bucket: &str) -> Option<bool> {
        self.lock().buckets.get(bucket).map(|b| b.public)
    }

    /// Returns a stored object.
    pub fn object(&self, bucket: &str, path: &str) -> Option<StoredObject> {
        self.lock()
            .buckets
            .get(bucket)
            .and_then(|b| b.objects.get(path).cloned())
    }

    /// Returns all object paths of a bucket in ascending order.
    pub fn object_paths(&self, bucket: &str) -> Vec<String> {
        self.lock()
            .buckets
            .get(bucket)
            .map(|b| b.objects.keys().cloned().collect())
            .unwrap_or_default()
    }
}

/// Computes the direct children of `prefix` from a flat key space.
fn children(bucket: &BucketState, prefix: &str, options: &ListOptions) -> Vec<ListEntry> {
    // Folders sort before files of the same name.
    let mut entries: BTreeMap<(String, bool), ListEntry> = BTreeMap::new();

    for (path, object) in &bucket.objects {
        let rest = if prefix.is_empty() {
            path.as_str()
        } else {
            match path
                .strip_prefix(prefix)
                .and_then(|r| r.strip_prefix('/'))
            {
                Some(rest) => rest,
                None => continue,
            }
        };

        let entry = match rest.split_once('/') {
            Some((folder, _)) => ListEntry::folder(folder),
            None => ListEntry::File {
                name: rest.to_owned(),
                id: object.id.clone(),
                metadata: Some(ObjectMetadata {
                    size: Some(object.data.len() as u64),
                    mimetype: object.content_type.clone(),
                    cache_control: object.cache_control.clone(),
                }),
            },
        };

        if let Some(search) = options.search.as_deref() {
            let name = entry.name().to_lowercase();
            if !name.starts_with(&search.to_lowercase()) {
                continue;
            }
        }

        entries.insert((entry.name().to_owned(), entry.is_file()), entry);
    }

    let mut entries: Vec<ListEntry> = entries.into_values().collect();
    if options.sort_by.order == SortOrder::Desc {
        entries.reverse();
    }

    entries
        .into_iter()
        .skip(options.offset as usize)
        .take(options.limit as usize)
        .collect()
}

#[async_trait::async_trait]
impl StorageProvider for MemoryStorage {
    async fn list_buckets(&self) -> Result<Vec<BucketInfo>> {
        let mut state = self.lock();
        state.record(Call {
            operation: Operation::ListBuckets,
            bucket: None,
            target: None,
        })?;

        Ok(state
            .buckets
            .iter()
            .map(|(id, bucket)| BucketInfo::new(id.clone()).with_public(bucket.public))
            .collect())
    }

    async fn create_bucket(&self, request: &CreateBucket) -> Result<()> {
        let mut state = self.lock();
        state.record(Call {
            operation: Operation::CreateBucket,
            bucket: Some(request.id.clone()),
            target: Some(request.id.clone()),
        })?;

        if state.buckets.contains_key(&request.id) {
            return Err(Error::already_exists().with_message("The resource already exists"));
        }

        state.buckets.insert(
            request.id.clone(),
            BucketState {
                public: request.public,
                objects: BTreeMap::new(),
            },
        );
        Ok(())
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        options: &ListOptions,
    ) -> Result<Vec<ListEntry>> {
        let mut state = self.lock();
        state.record(Call {
            operation: Operation::ListObjects,
            bucket: Some(bucket.to_owned()),
            target: Some(prefix.to_owned()),
        })?;

        let bucket = state.bucket(bucket)?;
        Ok(children(bucket, prefix, options))
    }

    async fn download(&self, bucket: &str, path: &str) -> Result<ObjectBody> {
        let mut state = self.lock();
        state.record(Call {
            operation: Operation::Download,
            bucket: Some(bucket.to_owned()),
            target: Some(path.to_owned()),
        })?;

        let object = state.bucket(bucket)?.objects.get(path).ok_or_else(|| {
            Error::not_found().with_message(format!("Object not found: {bucket}/{path}"))
        })?;

        Ok(ObjectBody {
            data: object.data.clone(),
            content_type: object.content_type.clone(),
        })
    }

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        body: ObjectBody,
        options: &UploadOptions,
    ) -> Result<()> {
        let mut state = self.lock();
        state.record(Call {
            operation: Operation::Upload,
            bucket: Some(bucket.to_owned()),
            target: Some(path.to_owned()),
        })?;

        let exists = state.bucket(bucket)?.objects.contains_key(path);
        if exists && !options.upsert {
            return Err(Error::already_exists().with_message("The resource already exists"));
        }

        let mut body = body;
        if options.content_type.is_some() {
            body.content_type = options.content_type.clone();
        }
        state.insert(bucket, path, body, options.cache_control.clone());
        Ok(())
    }
}

/// Builds a storage holding `paths` in `bucket`, each with its path as body.
pub fn storage_with_paths(bucket: &str, paths: &[&str]) -> MemoryStorage {
    paths.iter().fold(MemoryStorage::new().with_bucket(bucket), |storage, path| {
        let body = Bytes::from(path.to_string());
        storage.with_object(bucket, path, body, Some("application/octet-stream"))
    })
}
