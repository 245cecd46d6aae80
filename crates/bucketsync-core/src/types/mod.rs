//! Storage domain types shared by providers and the migration pipeline.

mod bucket;
mod entry;
mod object;
mod options;

pub use bucket::{BucketInfo, CreateBucket};
pub use entry::{ListEntry, ObjectMetadata};
pub use object::{ObjectBody, ObjectPath, PATH_SEPARATOR};
pub use options::{DEFAULT_PAGE_SIZE, ListOptions, SortBy, SortOrder, UploadOptions};
