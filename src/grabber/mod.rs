//! Blocking file retrieval for a bucket-backed repository
//!
//! A [`Grabber`] owns a single-threaded tokio runtime and drives the async
//! storage client on it, so every operation blocks the calling thread until
//! the request finishes. Do not call it from inside an async runtime.

mod keys;
mod reader;
mod retry;

pub use keys::{download_key, read_key};
pub use reader::ObjectReader;
pub use retry::{DEFAULT_BACKOFF, DEFAULT_DELAY_SECS, RetryPolicy};

use crate::observability::{GrabMetrics, MetricsSnapshot};
use crate::repo::BucketLocation;
use crate::storage::{Connector, StorageClient, StorageError, StoreTarget};
use bytes::Bytes;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::runtime::{Builder, Runtime};
use tracing::info;

#[derive(Debug, Error)]
pub enum GrabError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Failed to start storage runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

impl GrabError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, GrabError::Storage(StorageError::NotFound { .. }))
    }
}

pub type Result<T> = std::result::Result<T, GrabError>;

/// Everything a grabber is built from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrabberSettings {
    pub repo: String,
    pub profile: String,
    /// Region the repository declared; `None` lets the connector resolve it
    pub region: Option<String>,
    pub bucket: String,
    pub arch: String,
    pub retry: RetryPolicy,
}

impl GrabberSettings {
    pub fn new(
        repo: &str,
        profile: &str,
        region: Option<&str>,
        location: &BucketLocation,
        retries: Option<u32>,
        backoff: Option<u32>,
        delay: Option<u64>,
    ) -> Self {
        Self {
            repo: repo.to_string(),
            profile: profile.to_string(),
            region: region.map(str::to_string),
            bucket: location.bucket.clone(),
            arch: location.arch.clone(),
            retry: RetryPolicy::from_repo(retries, backoff, delay),
        }
    }

    fn target(&self) -> StoreTarget {
        StoreTarget {
            bucket: self.bucket.clone(),
            region: self.region.clone(),
            profile: self.profile.clone(),
        }
    }
}

/// Downloads repository files from the repository's bucket
pub struct Grabber {
    settings: GrabberSettings,
    client: StorageClient,
    runtime: Arc<Runtime>,
    metrics: GrabMetrics,
}

impl Grabber {
    /// Resolve a storage client for the settings' profile
    pub fn connect(settings: GrabberSettings, connector: &dyn Connector) -> Result<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(GrabError::Runtime)?;
        let store = runtime.block_on(connector.connect(&settings.target()))?;

        info!(
            repo = %settings.repo,
            profile = %settings.profile,
            bucket = %settings.bucket,
            "Initialized grabber"
        );

        Ok(Self {
            client: StorageClient::new(store, settings.bucket.clone()),
            settings,
            runtime: Arc::new(runtime),
            metrics: GrabMetrics::new(),
        })
    }

    pub fn settings(&self) -> &GrabberSettings {
        &self.settings
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Download `remote_path` into `filename`, overwriting it. Returns `filename`.
    pub fn fetch_to_file(&self, remote_path: &str, filename: impl AsRef<Path>) -> Result<PathBuf> {
        let target = filename.as_ref();
        let key = download_key(&self.settings.arch, &self.settings.bucket, remote_path);
        info!(bucket = %self.settings.bucket, key, path = %target.display(), "Fetching object to file");

        let written = self.runtime.block_on(
            self.settings
                .retry
                .run(&key, &self.metrics, || self.client.download_to(&key, target)),
        )?;
        self.metrics.fetched(written);

        Ok(target.to_path_buf())
    }

    /// Open `remote_path` for reading; the body is pulled as the reader is consumed
    pub fn open_stream(&self, remote_path: &str) -> Result<ObjectReader> {
        let key = download_key(&self.settings.arch, &self.settings.bucket, remote_path);
        info!(bucket = %self.settings.bucket, key, "Opening object stream");

        let stream = self.runtime.block_on(
            self.settings
                .retry
                .run(&key, &self.metrics, || self.client.open(&key)),
        )?;
        self.metrics.fetched(0);

        Ok(ObjectReader::new(key, Arc::clone(&self.runtime), stream))
    }

    /// Read the whole of `remote_path` into memory
    pub fn read_all(&self, remote_path: &str) -> Result<Bytes> {
        let key = read_key(&self.settings.arch, remote_path);
        info!(bucket = %self.settings.bucket, key, "Reading object");

        let bytes = self.runtime.block_on(
            self.settings
                .retry
                .run(&key, &self.metrics, || self.client.download(&key)),
        )?;
        self.metrics.fetched(bytes.len() as u64);

        Ok(bytes)
    }
}

impl std::fmt::Debug for Grabber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Grabber")
            .field("settings", &self.settings)
            .field("bucket", &self.client.bucket)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StaticConnector;
    use object_store::ObjectStore;
    use object_store::memory::InMemory;
    use object_store::path::Path as StoragePath;
    use std::io::Read;
    use tempfile::TempDir;

    fn fixture() -> (Grabber, Arc<InMemory>) {
        let store = Arc::new(InMemory::new());
        let location = BucketLocation {
            bucket: "my-bucket".to_string(),
            arch: "x86_64".to_string(),
        };
        let settings = GrabberSettings::new("internal", "default", None, &location, None, None, Some(0));
        let grabber = Grabber::connect(settings, &StaticConnector::new(store.clone())).unwrap();
        (grabber, store)
    }

    fn seed(grabber: &Grabber, store: &InMemory, key: &str, data: &'static [u8]) {
        grabber
            .runtime
            .block_on(store.put(&StoragePath::parse(key).unwrap(), Bytes::from_static(data).into()))
            .unwrap();
    }

    #[test]
    fn test_fetch_to_file_returns_filename() {
        let (grabber, store) = fixture();
        seed(&grabber, &store, "x86_64/Packages/a.rpm", b"rpm-bytes");

        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("a.rpm");

        let returned = grabber.fetch_to_file("Packages/a.rpm", &target).unwrap();
        assert_eq!(returned, target);
        assert_eq!(std::fs::read(&target).unwrap(), b"rpm-bytes");
        assert_eq!(grabber.metrics().bytes_fetched, 9);
    }

    #[test]
    fn test_open_stream_reads_lazily() {
        let (grabber, store) = fixture();
        seed(&grabber, &store, "x86_64/repodata/primary.xml", b"<metadata/>");

        let mut reader = grabber.open_stream("repodata/primary.xml").unwrap();
        assert_eq!(reader.key(), "x86_64/repodata/primary.xml");

        let mut first = [0u8; 4];
        reader.read_exact(&mut first).unwrap();
        assert_eq!(&first, b"<met");

        let mut rest = Vec::new();
        reader.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, b"adata/>");
    }

    #[test]
    fn test_missing_object_is_not_found() {
        let (grabber, _store) = fixture();

        let err = grabber.read_all("x86_64/repodata/missing.xml").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(grabber.metrics().failures, 1);
    }
}
