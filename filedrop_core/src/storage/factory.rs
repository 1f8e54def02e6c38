use std::sync::Arc;

use tracing::info;

use super::traits::{ObjectStore, StorageResult};
use super::{InMemoryObjectStore, LocalObjectStore, StorageGateway};
use crate::config::{StorageBackend, StorageConfig};

/// Build the object store selected by `config.backend`.
pub async fn create_object_store(config: &StorageConfig) -> StorageResult<Arc<dyn ObjectStore>> {
    let store: Arc<dyn ObjectStore> = match config.backend {
        StorageBackend::Memory => Arc::new(InMemoryObjectStore::new()),
        StorageBackend::Local => Arc::new(LocalObjectStore::new(&config.local_root).await?),
        #[cfg(feature = "gcs")]
        StorageBackend::Gcs => Arc::new(super::GcsObjectStore::new(config.credentials_path.clone())),
        #[cfg(not(feature = "gcs"))]
        StorageBackend::Gcs => {
            return Err(super::StorageError::Unavailable(
                "GCS backend requested but the `gcs` feature is disabled".to_string(),
            ))
        }
    };

    info!(backend = store.backend_name(), bucket = %config.bucket, "Object store initialized");
    Ok(store)
}

pub async fn create_gateway(config: &StorageConfig) -> StorageResult<StorageGateway> {
    let store = create_object_store(config).await?;
    Ok(StorageGateway::new(store, config.bucket.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_memory_backend() {
        let config = StorageConfig {
            backend: StorageBackend::Memory,
            ..StorageConfig::default()
        };
        let gateway = create_gateway(&config).await.unwrap();

        assert_eq!(gateway.backend_name(), "memory");
        assert_eq!(gateway.bucket(), config.bucket);
    }

    #[tokio::test]
    async fn test_local_backend_uses_root() {
        let temp_dir = TempDir::new().unwrap();
        let config = StorageConfig {
            backend: StorageBackend::Local,
            local_root: temp_dir.path().join("objects"),
            bucket: "uploads".to_string(),
            ..StorageConfig::default()
        };
        let gateway = create_gateway(&config).await.unwrap();

        gateway.upload("a.txt", Bytes::from_static(b"abc")).await.unwrap();

        assert_eq!(gateway.backend_name(), "local");
        assert!(temp_dir.path().join("objects").join("uploads").join("a.txt").exists());
    }
}
