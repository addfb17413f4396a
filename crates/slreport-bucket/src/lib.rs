//! Object storage used to fetch inbound reports and to archive raw copies
//! and per-entity exports.

mod local;
mod memory;
mod s3;

use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

pub use local::LocalBucketStore;
pub use memory::MemoryBucketStore;
pub use s3::{S3BucketStore, S3Config};

/// Bucket plus object key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectLocator {
    pub bucket: String,
    pub key: String,
}

impl ObjectLocator {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for ObjectLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

#[derive(Debug, Error)]
pub enum BucketError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("sdk error: {0}")]
    Sdk(String),
    #[error("object not found: {0}")]
    NotFound(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl BucketError {
    fn from_sdk(err: impl fmt::Display) -> Self {
        Self::Sdk(err.to_string())
    }
}

#[async_trait]
pub trait BucketStore: Send + Sync {
    async fn get_object(&self, locator: &ObjectLocator) -> Result<Bytes, BucketError>;
    async fn put_object(
        &self,
        locator: &ObjectLocator,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<(), BucketError>;
    async fn copy_object(
        &self,
        source: &ObjectLocator,
        destination: &ObjectLocator,
    ) -> Result<(), BucketError>;
}
