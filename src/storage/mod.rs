//! Source image retrieval
//!
//! Two collaborators feed bytes into the pipeline:
//! - [`ObjectStore`]: bucket + key lookups, backed by S3 in production
//! - [`UrlFetcher`]: plain HTTP(S) GETs for sources with no bucket mapping
//!
//! Both are traits so the service can be exercised with in-memory stores.

mod http;
mod s3;

pub use http::HttpFetcher;
pub use s3::S3Store;

use async_trait::async_trait;
use bytes::Bytes;

/// Errors raised while retrieving a source image
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// The object or URL does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Transport or backend failure
    #[error("storage error: {0}")]
    Io(String),

    /// The fetch did not complete within the request timeout
    #[error("timed out after {0}s")]
    Timeout(u64),
}

/// Bucket/key object storage
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Read the whole object into memory.
    async fn fetch_object(&self, bucket: &str, key: &str) -> Result<Bytes, StorageError>;

    /// Cheap round trip proving the backend is reachable.
    async fn health_check(&self) -> Result<(), StorageError>;
}

/// Generic HTTP(S) source fetcher
#[async_trait]
pub trait UrlFetcher: Send + Sync {
    async fn fetch_url(&self, url: &str) -> Result<Bytes, StorageError>;
}
