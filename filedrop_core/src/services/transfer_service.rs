use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    error::{AppError, Result},
    storage::{StorageError, StorageGateway},
    websocket::{NotificationEvent, NotificationHub},
};

/// Stages an upload request passes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UploadStage {
    Receiving,
    Persisting,
    Notifying,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadReceipt {
    pub name: String,
    pub size: u64,
    pub notified_channels: usize,
}

impl UploadReceipt {
    pub fn message(&self) -> String {
        format!("File uploaded successfully: {}", self.name)
    }
}

/// Ties the storage gateway to the notification hub. Holds no mutable state.
#[derive(Clone)]
pub struct FileTransferService {
    gateway: StorageGateway,
    hub: NotificationHub,
    max_upload_bytes: usize,
}

impl FileTransferService {
    pub fn new(gateway: StorageGateway, hub: NotificationHub, max_upload_bytes: usize) -> Self {
        Self {
            gateway,
            hub,
            max_upload_bytes,
        }
    }

    pub fn gateway(&self) -> &StorageGateway {
        &self.gateway
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    /// Fails with `PayloadTooLarge` when `size` exceeds the upload bound.
    pub fn check_size(&self, size: usize) -> Result<()> {
        if size > self.max_upload_bytes {
            return Err(AppError::PayloadTooLarge {
                size: size as u64,
                max_size: self.max_upload_bytes as u64,
            });
        }
        Ok(())
    }

    pub async fn upload(&self, name: &str, content: Bytes) -> Result<UploadReceipt> {
        let size = content.len();
        debug!(name = %name, size_bytes = size, stage = ?UploadStage::Receiving, "Upload received");

        if let Err(e) = self.check_size(size) {
            warn!(name = %name, size_bytes = size, stage = ?UploadStage::Failed, "Upload rejected: {}", e);
            return Err(e);
        }

        debug!(name = %name, stage = ?UploadStage::Persisting, "Persisting upload");
        if let Err(e) = self.gateway.upload(name, content).await {
            warn!(name = %name, stage = ?UploadStage::Failed, "Upload failed: {}", e);
            return Err(e.into());
        }

        debug!(name = %name, stage = ?UploadStage::Notifying, "Notifying channels");
        let report = self.hub.broadcast(NotificationEvent::file_available(name)).await;
        if report.dropped > 0 {
            debug!(name = %name, dropped = report.dropped, "Some channels missed the notification");
        }

        info!(
            name = %name,
            size_bytes = size,
            notified_channels = report.delivered,
            stage = ?UploadStage::Completed,
            "Upload completed"
        );

        Ok(UploadReceipt {
            name: name.to_string(),
            size: size as u64,
            notified_channels: report.delivered,
        })
    }

    /// Always re-queries the store.
    pub async fn list_files(&self) -> Result<Vec<String>> {
        Ok(self.gateway.list_names().await?)
    }

    pub async fn download_file(&self, name: &str) -> Result<Bytes> {
        match self.gateway.fetch(name).await {
            Ok(data) => Ok(data),
            Err(StorageError::NotFound(_)) => {
                Err(AppError::NotFound(format!("File not found: {}", name)))
            }
            Err(StorageError::InvalidName(reason)) => Err(AppError::BadRequest(reason)),
            Err(e) => Err(AppError::StorageUnavailable(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WebSocketConfig;
    use crate::storage::{InMemoryObjectStore, ObjectStore, StorageResult};
    use async_trait::async_trait;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    struct RejectingStore;

    #[async_trait]
    impl ObjectStore for RejectingStore {
        async fn put(&self, _bucket: &str, _name: &str, _data: Bytes) -> StorageResult<()> {
            Err(StorageError::Unavailable("quota exceeded".to_string()))
        }

        async fn get(&self, _bucket: &str, name: &str) -> StorageResult<Bytes> {
            Err(StorageError::NotFound(name.to_string()))
        }

        async fn list(&self, _bucket: &str) -> StorageResult<Vec<String>> {
            Ok(Vec::new())
        }

        fn backend_name(&self) -> &'static str {
            "rejecting"
        }
    }

    fn hub() -> NotificationHub {
        NotificationHub::new(&WebSocketConfig::default())
    }

    fn service_with(store: Arc<dyn ObjectStore>, hub: NotificationHub, limit: usize) -> FileTransferService {
        FileTransferService::new(StorageGateway::new(store, "test-bucket"), hub, limit)
    }

    #[tokio::test]
    async fn test_upload_persists_and_notifies() {
        let hub = hub();
        let (tx, mut rx) = mpsc::channel(4);
        hub.register("session-1", tx).await;
        let service = service_with(Arc::new(InMemoryObjectStore::new()), hub, 1024);

        let receipt = service.upload("a.txt", Bytes::from_static(b"hello")).await.unwrap();

        assert_eq!(receipt.name, "a.txt");
        assert_eq!(receipt.size, 5);
        assert_eq!(receipt.notified_channels, 1);
        assert_eq!(receipt.message(), "File uploaded successfully: a.txt");
        assert_eq!(rx.recv().await.unwrap(), NotificationEvent::file_available("a.txt"));
        assert_eq!(service.list_files().await.unwrap(), vec!["a.txt".to_string()]);
        assert_eq!(service.download_file("a.txt").await.unwrap(), Bytes::from_static(b"hello"));
    }

    #[tokio::test]
    async fn test_upload_without_listeners_still_succeeds() {
        let service = service_with(Arc::new(InMemoryObjectStore::new()), hub(), 1024);

        let receipt = service.upload("lonely.txt", Bytes::from_static(b"x")).await.unwrap();
        assert_eq!(receipt.notified_channels, 0);
    }

    #[tokio::test]
    async fn test_oversized_upload_never_reaches_store() {
        let hub = hub();
        let (tx, mut rx) = mpsc::channel(4);
        hub.register("session-1", tx).await;
        let service = service_with(Arc::new(RejectingStore), hub, 4);

        let result = service.upload("big.bin", Bytes::from_static(b"12345")).await;

        assert!(matches!(
            result,
            Err(AppError::PayloadTooLarge { size: 5, max_size: 4 })
        ));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_upload_at_exact_limit_is_accepted() {
        let service = service_with(Arc::new(InMemoryObjectStore::new()), hub(), 4);
        assert!(service.upload("edge.bin", Bytes::from_static(b"1234")).await.is_ok());
    }

    #[tokio::test]
    async fn test_store_failure_skips_notification() {
        let hub = hub();
        let (tx, mut rx) = mpsc::channel(4);
        hub.register("session-1", tx).await;
        let service = service_with(Arc::new(RejectingStore), hub, 1024);

        let result = service.upload("a.txt", Bytes::from_static(b"hello")).await;

        assert!(matches!(result, Err(AppError::StorageUnavailable(_))));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_dead_listener_does_not_fail_upload() {
        let hub = hub();
        let (tx, rx) = mpsc::channel(4);
        hub.register("session-1", tx).await;
        drop(rx);
        let service = service_with(Arc::new(InMemoryObjectStore::new()), hub.clone(), 1024);

        let receipt = service.upload("a.txt", Bytes::from_static(b"hello")).await.unwrap();

        assert_eq!(receipt.notified_channels, 0);
        assert_eq!(hub.channel_count().await, 0);
    }

    #[tokio::test]
    async fn test_download_missing_file() {
        let service = service_with(Arc::new(InMemoryObjectStore::new()), hub(), 1024);

        assert!(matches!(
            service.download_file("missing.txt").await,
            Err(AppError::NotFound(_))
        ));
    }
}
