//! Object storage access for bucket-backed repositories
//! Uses Apache Arrow object_store crate

mod connector;
mod credentials;

pub use connector::{Connector, ProfileConnector, StaticConnector, StoreTarget};
pub use credentials::ProfileCredentials;

use bytes::Bytes;
use futures::StreamExt;
use futures::stream::BoxStream;
use object_store::{GetResult, ObjectStore, path::Path as StoragePath};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::AsyncWriteExt;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Object not found: {key}")]
    NotFound {
        key: String,
        #[source]
        source: object_store::Error,
    },

    #[error("Access denied to {key}")]
    AccessDenied {
        key: String,
        #[source]
        source: object_store::Error,
    },

    #[error("Transport failure for {key}: {source}")]
    Transport {
        key: String,
        #[source]
        source: object_store::Error,
    },

    #[error("Failed to write {}: {source}", .path.display())]
    LocalIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Object key {key} cannot be addressed: {source}")]
    InvalidKey {
        key: String,
        #[source]
        source: object_store::path::Error,
    },

    #[error("No credentials available for profile '{profile}'")]
    MissingCredentials { profile: String },

    #[error("Failed to build storage client: {0}")]
    ClientBuild(#[from] object_store::Error),
}

impl StorageError {
    /// Sort a storage client error by what the caller can do about it
    pub fn classify(key: &str, source: object_store::Error) -> Self {
        let key = key.to_string();
        match source {
            object_store::Error::NotFound { .. } => StorageError::NotFound { key, source },
            object_store::Error::PermissionDenied { .. } | object_store::Error::Unauthenticated { .. } => {
                StorageError::AccessDenied { key, source }
            }
            _ => StorageError::Transport { key, source },
        }
    }

    /// Only transport failures are worth another attempt
    pub fn is_transient(&self) -> bool {
        matches!(self, StorageError::Transport { .. })
    }
}

/// Storage result type
pub type Result<T> = std::result::Result<T, StorageError>;

/// Byte stream over an object body
pub type ObjectStream = BoxStream<'static, object_store::Result<Bytes>>;

/// Object path for `key`, taken verbatim.
///
/// `Path::from` would percent-encode characters such as `~` that RPM
/// versions use; `Path::parse` only rejects keys S3 paths cannot express
/// (empty, `.` or `..` segments).
fn object_path(key: &str) -> Result<StoragePath> {
    StoragePath::parse(key).map_err(|source| StorageError::InvalidKey {
        key: key.to_string(),
        source,
    })
}

/// Storage client wrapping object_store
#[derive(Clone)]
pub struct StorageClient {
    store: Arc<dyn ObjectStore>,
    pub bucket: String,
}

impl StorageClient {
    /// Create new storage client with any object_store backend
    pub fn new(store: Arc<dyn ObjectStore>, bucket: String) -> Self {
        Self { store, bucket }
    }

    /// Create in-memory storage for testing
    pub fn in_memory(bucket: &str) -> Self {
        Self {
            store: Arc::new(object_store::memory::InMemory::new()),
            bucket: bucket.to_string(),
        }
    }

    async fn get(&self, key: &str) -> Result<GetResult> {
        let path = object_path(key)?;
        self.store
            .get(&path)
            .await
            .map_err(|e| StorageError::classify(key, e))
    }

    /// Download an object into `target`, replacing any existing file
    pub async fn download_to(&self, key: &str, target: &Path) -> Result<u64> {
        let local_io = |source: std::io::Error| StorageError::LocalIo {
            path: target.to_path_buf(),
            source,
        };

        // Only touch the local file once the object is known to exist
        let mut stream = self.get(key).await?.into_stream();
        let mut file = tokio::fs::File::create(target).await.map_err(local_io)?;
        let mut written = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| StorageError::classify(key, e))?;
            file.write_all(&chunk).await.map_err(local_io)?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(local_io)?;

        tracing::info!(key, size = written, path = %target.display(), "Downloaded from storage");

        Ok(written)
    }

    /// Open an object for incremental reading
    pub async fn open(&self, key: &str) -> Result<ObjectStream> {
        let result = self.get(key).await?;
        tracing::info!(key, size = result.meta.size, "Opened object stream");
        Ok(result.into_stream())
    }

    /// Download an object into memory
    pub async fn download(&self, key: &str) -> Result<Bytes> {
        let bytes = self
            .get(key)
            .await?
            .bytes()
            .await
            .map_err(|e| StorageError::classify(key, e))?;

        tracing::info!(key, size = bytes.len(), "Downloaded from storage");

        Ok(bytes)
    }

    /// Store bytes under `key`
    pub async fn upload(&self, key: &str, data: impl Into<Bytes>) -> Result<()> {
        let path = object_path(key)?;
        let data: Bytes = data.into();
        let size = data.len();

        self.store
            .put(&path, data.into())
            .await
            .map_err(|e| StorageError::classify(key, e))?;

        tracing::info!(key, size, "Uploaded to storage");
        Ok(())
    }
}
