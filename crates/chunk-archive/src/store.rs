//! Storage backends for the archive.
//!
//! The archive tree lives either on a local filesystem or in an
//! S3-compatible bucket. Both answer the same question: the bytes at a
//! relative path, or `None` when the object does not exist. A missing
//! object is not an error anywhere in the read path.

use async_trait::async_trait;
use bytes::Bytes;
use object_store::{aws::AmazonS3Builder, path::Path as ObjectPath, ObjectStore};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, instrument};

use pointcast_common::{PointcastError, Result};

/// Configuration for S3/MinIO-compatible object storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// S3/MinIO endpoint URL
    pub endpoint: String,
    /// Bucket name
    pub bucket: String,
    /// Access key ID
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// AWS region (use "us-east-1" for MinIO)
    pub region: String,
    /// Allow HTTP (for local MinIO)
    pub allow_http: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://minio:9000".to_string(),
            bucket: "forecast-archive".to_string(),
            access_key_id: "minioadmin".to_string(),
            secret_access_key: "minioadmin".to_string(),
            region: "us-east-1".to_string(),
            allow_http: true,
        }
    }
}

/// A read-only archive backend.
#[async_trait]
pub trait ArchiveStore: Send + Sync {
    /// Fetch a whole object. `Ok(None)` when it does not exist.
    async fn fetch(&self, path: &str) -> Result<Option<Bytes>>;
}

/// Archive rooted in a local directory.
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ArchiveStore for LocalStore {
    async fn fetch(&self, path: &str) -> Result<Option<Bytes>> {
        let full = self.root.join(path);
        match tokio::fs::read(&full).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PointcastError::storage(format!(
                "read {}: {e}",
                full.display()
            ))),
        }
    }
}

/// Archive in an S3-compatible bucket.
pub struct RemoteStore {
    store: Arc<dyn ObjectStore>,
    bucket: String,
}

impl RemoteStore {
    pub fn new(config: &StorageConfig) -> Result<Self> {
        let mut builder = AmazonS3Builder::new()
            .with_endpoint(&config.endpoint)
            .with_bucket_name(&config.bucket)
            .with_access_key_id(&config.access_key_id)
            .with_secret_access_key(&config.secret_access_key)
            .with_region(&config.region);

        if config.allow_http {
            builder = builder.with_allow_http(true);
        }

        let store = builder
            .build()
            .map_err(|e| PointcastError::storage(format!("failed to create S3 client: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            bucket: config.bucket.clone(),
        })
    }
}

#[async_trait]
impl ArchiveStore for RemoteStore {
    #[instrument(skip(self), fields(bucket = %self.bucket, path = %path))]
    async fn fetch(&self, path: &str) -> Result<Option<Bytes>> {
        let location = ObjectPath::from(path);

        let result = match self.store.get(&location).await {
            Ok(r) => r,
            Err(object_store::Error::NotFound { .. }) => return Ok(None),
            Err(e) => {
                return Err(PointcastError::storage(format!("failed to read {path}: {e}")));
            }
        };

        let bytes = result
            .bytes()
            .await
            .map_err(|e| PointcastError::storage(format!("failed to read bytes: {e}")))?;

        debug!(size = bytes.len(), "fetched object");
        Ok(Some(bytes))
    }
}
