use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use bytes::Bytes;

use crate::{BucketError, BucketStore, ObjectLocator};

/// In-process store, used for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemoryBucketStore {
    objects: Mutex<BTreeMap<ObjectLocator, Bytes>>,
}

impl MemoryBucketStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn objects(&self) -> MutexGuard<'_, BTreeMap<ObjectLocator, Bytes>> {
        self.objects
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn insert(&self, locator: ObjectLocator, bytes: impl Into<Bytes>) {
        self.objects().insert(locator, bytes.into());
    }

    pub fn get(&self, locator: &ObjectLocator) -> Option<Bytes> {
        self.objects().get(locator).cloned()
    }

    /// Keys held in `bucket`, in sorted order.
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.objects()
            .keys()
            .filter(|locator| locator.bucket == bucket)
            .map(|locator| locator.key.clone())
            .collect()
    }
}

#[async_trait]
impl BucketStore for MemoryBucketStore {
    async fn get_object(&self, locator: &ObjectLocator) -> Result<Bytes, BucketError> {
        self.get(locator)
            .ok_or_else(|| BucketError::NotFound(locator.to_string()))
    }

    async fn put_object(
        &self,
        locator: &ObjectLocator,
        bytes: Bytes,
        _content_type: &str,
    ) -> Result<(), BucketError> {
        self.insert(locator.clone(), bytes);
        Ok(())
    }

    async fn copy_object(
        &self,
        source: &ObjectLocator,
        destination: &ObjectLocator,
    ) -> Result<(), BucketError> {
        let contents = self.get_object(source).await?;
        self.insert(destination.clone(), contents);
        Ok(())
    }
}
