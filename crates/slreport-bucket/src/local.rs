use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tracing::debug;

use crate::{BucketError, BucketStore, ObjectLocator};

/// Filesystem-backed store: each bucket is a directory under `root`.
#[derive(Debug, Clone)]
pub struct LocalBucketStore {
    root: PathBuf,
}

impl LocalBucketStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, locator: &ObjectLocator) -> Result<PathBuf, BucketError> {
        let relative = Path::new(&locator.bucket).join(&locator.key);
        if relative
            .components()
            .any(|component| !matches!(component, Component::Normal(_)))
        {
            return Err(BucketError::Configuration(format!(
                "locator {locator} escapes the store root"
            )));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl BucketStore for LocalBucketStore {
    async fn get_object(&self, locator: &ObjectLocator) -> Result<Bytes, BucketError> {
        let path = self.path_for(locator)?;
        match fs::read(&path).await {
            Ok(contents) => Ok(Bytes::from(contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(BucketError::NotFound(locator.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn put_object(
        &self,
        locator: &ObjectLocator,
        bytes: Bytes,
        _content_type: &str,
    ) -> Result<(), BucketError> {
        let path = self.path_for(locator)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        debug!(path = %path.display(), size = bytes.len(), "writing object");
        fs::write(&path, &bytes).await?;
        Ok(())
    }

    async fn copy_object(
        &self,
        source: &ObjectLocator,
        destination: &ObjectLocator,
    ) -> Result<(), BucketError> {
        let contents = self.get_object(source).await?;
        self.put_object(destination, contents, "application/octet-stream")
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trips_and_copies_objects() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = LocalBucketStore::new(dir.path());
        let source = ObjectLocator::new("reports", "Bunbury Service Level Report 01-04-2023.xlsx");
        let archive = ObjectLocator::new("reports_output", "20230401_10:00:00_report.xlsx");

        store
            .put_object(&source, Bytes::from_static(b"workbook"), "application/octet-stream")
            .await
            .expect("put");
        store.copy_object(&source, &archive).await.expect("copy");

        let copied = store.get_object(&archive).await.expect("get");
        assert_eq!(copied.as_ref(), b"workbook");
        assert!(dir.path().join("reports_output").is_dir());
    }

    #[tokio::test]
    async fn missing_object_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = LocalBucketStore::new(dir.path());
        let err = store
            .get_object(&ObjectLocator::new("reports", "absent.xlsx"))
            .await
            .expect_err("absent object");
        assert!(matches!(err, BucketError::NotFound(_)));
    }

    #[test]
    fn rejects_parent_traversal() {
        let store = LocalBucketStore::new("/data");
        let err = store
            .path_for(&ObjectLocator::new("reports", "../etc/passwd"))
            .expect_err("traversal");
        assert!(matches!(err, BucketError::Configuration(_)));
    }
}
