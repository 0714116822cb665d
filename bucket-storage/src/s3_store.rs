use std::time::Duration;
use async_trait::async_trait;
use aws_config::meta::region::RegionProviderChain;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Builder;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use crate::errors::{StorageError, StorageResult};
use crate::store::{BucketStore, ObjectWriter, PendingObject};

/// Creates an S3 client from the ambient AWS configuration.
///
/// When `endpoint_url` is set the client talks to that S3-compatible endpoint
/// (MinIO, Tigris, GCS interop) using path-style addressing.
pub async fn create_s3_client(endpoint_url: Option<&str>) -> S3Client {
    // Region is required by the SDK even when the endpoint ignores it
    let region_provider = RegionProviderChain::default_provider().or_else("us-east-1");
    let base_config = aws_config::defaults(BehaviorVersion::latest())
        .region(region_provider)
        .load()
        .await;

    let mut config = Builder::from(&base_config);
    if let Some(endpoint_url) = endpoint_url {
        config = config.endpoint_url(endpoint_url).force_path_style(true);
    }

    S3Client::from_conf(config.build())
}

/// A `BucketStore` writing objects into one S3-compatible bucket.
#[derive(Clone, Debug)]
pub struct S3Bucket {
    client: S3Client,
    bucket: String,
    write_timeout: Duration,
}

impl S3Bucket {
    pub fn new(client: S3Client, bucket: impl Into<String>, write_timeout: Duration) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            write_timeout,
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Creates the bucket when it does not exist yet.
    pub async fn ensure_bucket(&self) -> StorageResult<()> {
        match self.client.head_bucket().bucket(&self.bucket).send().await {
            Ok(_) => Ok(()),
            Err(SdkError::ServiceError(service_err)) if service_err.err().is_not_found() => {
                tracing::info!(bucket = %self.bucket, "creating missing bucket");
                self.client
                    .create_bucket()
                    .bucket(&self.bucket)
                    .send()
                    .await
                    .map_err(StorageError::backend)?;
                Ok(())
            }
            Err(e) => Err(StorageError::backend(e)),
        }
    }
}

impl BucketStore for S3Bucket {
    fn new_writer(&self, key_hint: &str) -> Box<dyn ObjectWriter> {
        Box::new(S3ObjectWriter {
            bucket: self.clone(),
            pending: PendingObject::new(key_hint),
        })
    }
}

struct S3ObjectWriter {
    bucket: S3Bucket,
    pending: PendingObject,
}

#[async_trait]
impl ObjectWriter for S3ObjectWriter {
    async fn write(&mut self, data: &[u8]) -> StorageResult<usize> {
        self.pending.append(data)
    }

    async fn close(&mut self) -> StorageResult<()> {
        let data = self.pending.seal()?;
        let key = self.pending.key.clone();
        let size = data.len();

        let put = self
            .bucket
            .client
            .put_object()
            .bucket(&self.bucket.bucket)
            .key(&key)
            .set_content_type(self.pending.content_type.clone())
            .body(ByteStream::from(data))
            .send();

        match tokio::time::timeout(self.bucket.write_timeout, put).await {
            Ok(Ok(_)) => {
                tracing::debug!(bucket = %self.bucket.bucket, key = %key, size, "put object");
                Ok(())
            }
            Ok(Err(e)) => Err(StorageError::backend(e)),
            Err(_) => Err(StorageError::Timeout {
                key,
                timeout: self.bucket.write_timeout,
            }),
        }
    }

    fn set_content_type(&mut self, content_type: &str) {
        self.pending.set_content_type(content_type);
    }
}
