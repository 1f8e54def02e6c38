use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;

use super::traits::{ObjectStore, StorageError, StorageResult};

/// Process-local object store used for development and tests.
#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    buckets: RwLock<HashMap<String, HashMap<String, Bytes>>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn put(&self, bucket: &str, name: &str, data: Bytes) -> StorageResult<()> {
        let mut buckets = self.buckets.write();
        buckets
            .entry(bucket.to_string())
            .or_default()
            .insert(name.to_string(), data);
        Ok(())
    }

    async fn get(&self, bucket: &str, name: &str) -> StorageResult<Bytes> {
        let buckets = self.buckets.read();
        buckets
            .get(bucket)
            .and_then(|objects| objects.get(name))
            .cloned()
            .ok_or_else(|| StorageError::NotFound(name.to_string()))
    }

    async fn list(&self, bucket: &str) -> StorageResult<Vec<String>> {
        let buckets = self.buckets.read();
        Ok(buckets
            .get(bucket)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
