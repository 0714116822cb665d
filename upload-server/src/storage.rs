use std::sync::Arc;
use bucket_storage::{create_s3_client, BucketStore, LocalDirBucket, MemoryBucket, S3Bucket, StorageResult};
use crate::params::{Args, StorageBackend};

/// Builds the bucket handle shared by all handlers.
pub async fn build_store(args: &Args) -> StorageResult<Arc<dyn BucketStore>> {
    match args.storage {
        StorageBackend::S3 => {
            let client = create_s3_client(args.endpoint_url.as_deref()).await;
            let bucket = S3Bucket::new(client, args.bucket.clone(), args.write_timeout());
            if args.create_bucket {
                bucket.ensure_bucket().await?;
            }
            tracing::info!(bucket = bucket.bucket(), endpoint = ?args.endpoint_url, "using S3 storage");
            Ok(Arc::new(bucket))
        }
        StorageBackend::Local => {
            let bucket = LocalDirBucket::new(args.local_dir.join(&args.bucket));
            bucket.ensure_dir().await?;
            tracing::info!(path = %bucket.base_path().display(), "using local storage");
            Ok(Arc::new(bucket))
        }
        StorageBackend::Memory => {
            tracing::warn!("using in-memory storage, objects are lost on exit");
            Ok(Arc::new(MemoryBucket::new()))
        }
    }
}
