use std::path::PathBuf;
use async_trait::async_trait;
use tokio::fs;
use crate::errors::StorageResult;
use crate::store::{BucketStore, ObjectWriter, PendingObject};

/// Stores each object as a file named by its key under `base_path`.
#[derive(Clone, Debug)]
pub struct LocalDirBucket {
    base_path: PathBuf,
}

impl LocalDirBucket {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self { base_path: base_path.into() }
    }

    /// Creates the base directory if it is missing.
    pub async fn ensure_dir(&self) -> StorageResult<()> {
        fs::create_dir_all(&self.base_path).await?;
        Ok(())
    }

    pub fn base_path(&self) -> &PathBuf {
        &self.base_path
    }
}

impl BucketStore for LocalDirBucket {
    fn new_writer(&self, key_hint: &str) -> Box<dyn ObjectWriter> {
        Box::new(LocalObjectWriter {
            base_path: self.base_path.clone(),
            pending: PendingObject::new(key_hint),
        })
    }
}

struct LocalObjectWriter {
    base_path: PathBuf,
    pending: PendingObject,
}

#[async_trait]
impl ObjectWriter for LocalObjectWriter {
    async fn write(&mut self, data: &[u8]) -> StorageResult<usize> {
        self.pending.append(data)
    }

    async fn close(&mut self) -> StorageResult<()> {
        let data = self.pending.seal()?;
        let path = self.base_path.join(&self.pending.key);
        fs::write(&path, data).await?;
        tracing::debug!(path = %path.display(), "wrote local object");
        Ok(())
    }

    // Plain files have nowhere to keep a media type.
    fn set_content_type(&mut self, content_type: &str) {
        self.pending.set_content_type(content_type);
    }
}
