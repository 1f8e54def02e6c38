use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use object_store::gcp::{GoogleCloudStorage, GoogleCloudStorageBuilder};
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::{ObjectStore as _, ObjectStoreExt as _, PutPayload};
use parking_lot::Mutex;

use super::traits::{ObjectStore, StorageError, StorageResult};

/// Google Cloud Storage backend built on the `object_store` crate.
///
/// Credentials come from `credentials_path` when given, otherwise from the
/// standard `GOOGLE_*` environment variables. One client is built lazily per
/// bucket and reused.
pub struct GcsObjectStore {
    credentials_path: Option<PathBuf>,
    clients: Mutex<HashMap<String, Arc<GoogleCloudStorage>>>,
}

impl GcsObjectStore {
    pub fn new(credentials_path: Option<PathBuf>) -> Self {
        Self {
            credentials_path,
            clients: Mutex::new(HashMap::new()),
        }
    }

    fn client(&self, bucket: &str) -> StorageResult<Arc<GoogleCloudStorage>> {
        let mut clients = self.clients.lock();
        if let Some(client) = clients.get(bucket) {
            return Ok(client.clone());
        }

        let mut builder = GoogleCloudStorageBuilder::from_env().with_bucket_name(bucket);
        if let Some(path) = &self.credentials_path {
            builder = builder.with_service_account_path(path.to_string_lossy());
        }

        let client = Arc::new(builder.build().map_err(|e| {
            StorageError::Unavailable(format!("Failed to configure GCS client: {}", e))
        })?);
        clients.insert(bucket.to_string(), client.clone());
        Ok(client)
    }
}

/// Object key for an uploaded name. The key's raw text is the name itself, so
/// listing hands back exactly what was uploaded.
fn object_key(name: &str) -> StorageResult<Path> {
    Path::parse(name).map_err(|e| StorageError::InvalidName(e.to_string()))
}

/// Name of a top-level object, or `None` for keys nested under a prefix.
fn listed_name(location: &Path) -> Option<String> {
    match location.parts().count() {
        1 => Some(location.as_ref().to_string()),
        _ => None,
    }
}

fn map_error(name: &str, err: ObjectStoreError) -> StorageError {
    match err {
        ObjectStoreError::NotFound { .. } => StorageError::NotFound(name.to_string()),
        other => StorageError::Unavailable(other.to_string()),
    }
}

#[async_trait]
impl ObjectStore for GcsObjectStore {
    async fn put(&self, bucket: &str, name: &str, data: Bytes) -> StorageResult<()> {
        let location = object_key(name)?;
        let client = self.client(bucket)?;
        let size = data.len();
        let start = std::time::Instant::now();

        client
            .put(&location, PutPayload::from(data))
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %bucket,
                    name = %name,
                    size_bytes = size,
                    "GCS upload failed"
                );
                map_error(name, e)
            })?;

        tracing::debug!(
            bucket = %bucket,
            name = %name,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "GCS upload successful"
        );

        Ok(())
    }

    async fn get(&self, bucket: &str, name: &str) -> StorageResult<Bytes> {
        let location = object_key(name)?;
        let client = self.client(bucket)?;

        let result = client.get(&location).await.map_err(|e| map_error(name, e))?;
        result.bytes().await.map_err(|e| map_error(name, e))
    }

    async fn list(&self, bucket: &str) -> StorageResult<Vec<String>> {
        let client = self.client(bucket)?;

        // Non-recursive: objects under `dir/` prefixes are not servable names.
        let listing = client
            .list_with_delimiter(None)
            .await
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;

        Ok(listing
            .objects
            .iter()
            .filter_map(|meta| listed_name(&meta.location))
            .collect())
    }

    fn backend_name(&self) -> &'static str {
        "gcs"
    }
}
