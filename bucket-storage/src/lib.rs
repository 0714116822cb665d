//! Write-only object storage behind a narrow capability: a bucket hands out
//! writers, each writer commits exactly one freshly named object on close.

pub mod errors;
pub mod local_store;
pub mod memory_store;
pub mod s3_store;
pub mod store;

pub use errors::{StorageError, StorageResult};
pub use local_store::LocalDirBucket;
pub use memory_store::{MemoryBucket, StoredObject};
pub use s3_store::{create_s3_client, S3Bucket};
pub use store::{new_object_key, BucketStore, ObjectWriter};
