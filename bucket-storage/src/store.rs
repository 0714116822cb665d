use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::StorageResult;

/// A byte sink bound to a single, not yet visible object.
///
/// Bytes handed to `write` are buffered by the backend. The object only becomes
/// visible once `close` returns `Ok`. Any failure is terminal for the writer.
#[async_trait]
pub trait ObjectWriter: Send {
    /// Appends `data` to the pending object and returns how many bytes were taken.
    async fn write(&mut self, data: &[u8]) -> StorageResult<usize>;

    /// Commits the object to the backing store.
    async fn close(&mut self) -> StorageResult<()>;

    /// Advisory media type stored alongside the object.
    fn set_content_type(&mut self, content_type: &str);
}

/// Hands out writers for fresh objects in a single bucket.
pub trait BucketStore: Send + Sync {
    /// Returns a writer for a new object.
    ///
    /// `key_hint` is informational only: the object is always named by
    /// [`new_object_key`], so callers cannot choose or predict the destination.
    fn new_writer(&self, key_hint: &str) -> Box<dyn ObjectWriter>;
}

/// Generates the name of a new object.
pub fn new_object_key() -> String {
    Uuid::new_v4().to_string()
}

/// Shared buffering state for writers that commit the whole payload on close.
#[derive(Debug, Default)]
pub(crate) struct PendingObject {
    pub(crate) key: String,
    pub(crate) data: Vec<u8>,
    pub(crate) content_type: Option<String>,
    pub(crate) closed: bool,
}

impl PendingObject {
    pub(crate) fn new(key_hint: &str) -> Self {
        let key = new_object_key();
        tracing::debug!(key = %key, key_hint, "allocated object key");
        Self {
            key,
            ..Default::default()
        }
    }

    pub(crate) fn append(&mut self, data: &[u8]) -> StorageResult<usize> {
        if self.closed {
            return Err(crate::StorageError::Closed(self.key.clone()));
        }
        self.data.extend_from_slice(data);
        Ok(data.len())
    }

    /// Marks the object closed and hands back the buffered payload.
    pub(crate) fn seal(&mut self) -> StorageResult<Vec<u8>> {
        if self.closed {
            return Err(crate::StorageError::Closed(self.key.clone()));
        }
        self.closed = true;
        Ok(std::mem::take(&mut self.data))
    }

    pub(crate) fn set_content_type(&mut self, content_type: &str) {
        if !self.closed {
            self.content_type = Some(content_type.to_string());
        }
    }
}
