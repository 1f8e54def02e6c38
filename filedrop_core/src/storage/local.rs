use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use super::traits::{ObjectStore, StorageError, StorageResult};

const TEMP_PREFIX: &str = ".filedrop-tmp-";

/// Filesystem-backed object store. Each bucket is a directory under `root`.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub async fn new(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();

        fs::create_dir_all(&root).await.map_err(|e| {
            StorageError::Unavailable(format!(
                "Failed to create storage directory {}: {}",
                root.display(),
                e
            ))
        })?;

        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn bucket_dir(&self, bucket: &str) -> StorageResult<PathBuf> {
        if bucket.is_empty() || bucket.contains(['/', '\\']) || bucket == "." || bucket == ".." {
            return Err(StorageError::Unavailable(format!(
                "Bucket name cannot be mapped to a directory: {:?}",
                bucket
            )));
        }
        Ok(self.root.join(bucket))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put(&self, bucket: &str, name: &str, data: Bytes) -> StorageResult<()> {
        let dir = self.bucket_dir(bucket)?;
        fs::create_dir_all(&dir).await?;

        let final_path = dir.join(name);
        let temp_path = dir.join(format!("{}{}", TEMP_PREFIX, Uuid::new_v4()));
        let start = std::time::Instant::now();

        let write = async {
            let mut file = fs::File::create(&temp_path).await?;
            file.write_all(&data).await?;
            file.sync_all().await?;
            fs::rename(&temp_path, &final_path).await
        };

        if let Err(e) = write.await {
            let _ = fs::remove_file(&temp_path).await;
            tracing::error!(
                error = %e,
                path = %final_path.display(),
                "Local storage write failed"
            );
            return Err(StorageError::Unavailable(format!(
                "Failed to write {}: {}",
                final_path.display(),
                e
            )));
        }

        tracing::debug!(
            path = %final_path.display(),
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage write successful"
        );

        Ok(())
    }

    async fn get(&self, bucket: &str, name: &str) -> StorageResult<Bytes> {
        let path = self.bucket_dir(bucket)?.join(name);

        match fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound(name.to_string())),
            Err(e) => Err(StorageError::Unavailable(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn list(&self, bucket: &str) -> StorageResult<Vec<String>> {
        let dir = self.bucket_dir(bucket)?;

        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) if !name.starts_with(TEMP_PREFIX) => names.push(name),
                Ok(_) => {}
                Err(raw) => tracing::warn!("Skipping non UTF-8 object name: {:?}", raw),
            }
        }

        Ok(names)
    }

    fn backend_name(&self) -> &'static str {
        "local"
    }
}
