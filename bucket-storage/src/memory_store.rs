use std::collections::BTreeMap;
use std::sync::Arc;
use async_trait::async_trait;
use tokio::sync::RwLock;
use crate::errors::StorageResult;
use crate::store::{BucketStore, ObjectWriter, PendingObject};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub data: Vec<u8>,
    pub content_type: Option<String>,
}

/// Keeps objects in process memory. Clones share the same objects.
#[derive(Clone, Debug, Default)]
pub struct MemoryBucket {
    objects: Arc<RwLock<BTreeMap<String, StoredObject>>>,
}

impl MemoryBucket {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }

    pub async fn get(&self, key: &str) -> Option<StoredObject> {
        self.objects.read().await.get(key).cloned()
    }

    pub async fn keys(&self) -> Vec<String> {
        self.objects.read().await.keys().cloned().collect()
    }
}

impl BucketStore for MemoryBucket {
    fn new_writer(&self, key_hint: &str) -> Box<dyn ObjectWriter> {
        Box::new(MemoryObjectWriter {
            objects: self.objects.clone(),
            pending: PendingObject::new(key_hint),
        })
    }
}

struct MemoryObjectWriter {
    objects: Arc<RwLock<BTreeMap<String, StoredObject>>>,
    pending: PendingObject,
}

#[async_trait]
impl ObjectWriter for MemoryObjectWriter {
    async fn write(&mut self, data: &[u8]) -> StorageResult<usize> {
        self.pending.append(data)
    }

    async fn close(&mut self) -> StorageResult<()> {
        let data = self.pending.seal()?;
        let object = StoredObject {
            data,
            content_type: self.pending.content_type.clone(),
        };
        self.objects.write().await.insert(self.pending.key.clone(), object);
        Ok(())
    }

    fn set_content_type(&mut self, content_type: &str) {
        self.pending.set_content_type(content_type);
    }
}
