//! Object store abstraction
//!
//! Every backend exposes the same three operations, addressed by bucket and
//! object name. Backends overwrite on collision and keep no versions.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid object name: {0}")]
    InvalidName(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Unavailable(err.to_string())
    }
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write `data` under `name`. Replaces any existing object with that name.
    async fn put(&self, bucket: &str, name: &str, data: Bytes) -> StorageResult<()>;

    /// Read the object stored under `name`.
    async fn get(&self, bucket: &str, name: &str) -> StorageResult<Bytes>;

    /// Names of all objects currently in `bucket`, in no particular order.
    async fn list(&self, bucket: &str) -> StorageResult<Vec<String>>;

    fn backend_name(&self) -> &'static str;
}
