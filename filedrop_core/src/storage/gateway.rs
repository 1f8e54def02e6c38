use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, info};

use super::traits::{ObjectStore, StorageError, StorageResult};

pub const MAX_NAME_LENGTH: usize = 1024;

/// Single entry point to the object store for one configured bucket.
#[derive(Clone)]
pub struct StorageGateway {
    store: Arc<dyn ObjectStore>,
    bucket: String,
}

impl StorageGateway {
    pub fn new(store: Arc<dyn ObjectStore>, bucket: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }

    /// Durably store `content` under `name`, replacing any previous object.
    pub async fn upload(&self, name: &str, content: Bytes) -> StorageResult<()> {
        validate_name(name)?;
        let size = content.len();

        self.store.put(&self.bucket, name, content).await?;

        info!(bucket = %self.bucket, name = %name, size_bytes = size, "File stored");
        Ok(())
    }

    pub async fn fetch(&self, name: &str) -> StorageResult<Bytes> {
        validate_name(name)?;
        let data = self.store.get(&self.bucket, name).await?;

        debug!(bucket = %self.bucket, name = %name, size_bytes = data.len(), "File fetched");
        Ok(data)
    }

    /// All stored names. Order is whatever the backend returns.
    pub async fn list_names(&self) -> StorageResult<Vec<String>> {
        self.store.list(&self.bucket).await
    }
}

/// Reject names the backends cannot store as a single flat object.
pub fn validate_name(name: &str) -> StorageResult<()> {
    if name.is_empty() {
        return Err(StorageError::InvalidName("File name cannot be empty".to_string()));
    }

    if name.len() > MAX_NAME_LENGTH {
        return Err(StorageError::InvalidName(format!(
            "File name too long: {} bytes (max: {})",
            name.len(),
            MAX_NAME_LENGTH
        )));
    }

    if name == "." || name == ".." {
        return Err(StorageError::InvalidName(format!("Invalid file name: {}", name)));
    }

    if name.contains(['/', '\\']) || name.chars().any(char::is_control) {
        return Err(StorageError::InvalidName(format!(
            "File name contains forbidden characters: {:?}",
            name
        )));
    }

    Ok(())
}
