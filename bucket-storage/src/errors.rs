use std::error::Error;
use std::time::Duration;
use thiserror::Error;

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object {0} is already closed")]
    Closed(String),

    #[error("writing object {key} timed out after {timeout:?}")]
    Timeout { key: String, timeout: Duration },

    #[error("local storage failure")]
    Io(#[from] std::io::Error),

    #[error("object storage backend failure")]
    Backend(#[source] Box<dyn Error + Send + Sync>),
}

impl StorageError {
    pub fn backend<E>(err: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        StorageError::Backend(Box::new(err))
    }
}
