//! A blob store backed by a local directory.

use std::{io::Write as _, path::PathBuf};

use super::{BlobId, BlobStore};
use crate::{Error, Result};

/// Objects are files directly inside `root`; the blob id is the file name.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
  root: PathBuf,
}

impl FsBlobStore {
  pub fn new(root: impl Into<PathBuf>) -> Self { Self { root: root.into() } }

  fn path_for(&self, name: &str) -> Result<PathBuf> {
    let valid = !name.is_empty()
      && name != "."
      && name != ".."
      && !name.contains(['/', '\\']);
    if !valid {
      return Err(Error::ExternalService(format!("invalid object name: {name:?}")));
    }
    Ok(self.root.join(name))
  }

  /// Write via a uniquely named temporary sibling and rename, so readers
  /// never see a partially written object and concurrent writers never share
  /// a temporary file.
  async fn write_atomic(&self, path: PathBuf, body: Vec<u8>) -> Result<()> {
    let root = self.root.clone();
    tokio::task::spawn_blocking(move || -> Result<()> {
      std::fs::create_dir_all(&root)?;
      let mut tmp = tempfile::NamedTempFile::new_in(&root)?;
      tmp.write_all(&body)?;
      tmp.as_file().sync_all()?;
      tmp.persist(&path).map_err(|e| e.error)?;
      Ok(())
    })
    .await
    .map_err(|e| Error::Io(std::io::Error::other(e)))?
  }
}

impl BlobStore for FsBlobStore {
  async fn find(&self, name: &str) -> Result<Option<BlobId>> {
    let path = self.path_for(name)?;
    let exists = tokio::fs::try_exists(&path).await?;
    Ok(exists.then(|| BlobId::new(name)))
  }

  async fn download(&self, id: &BlobId) -> Result<Vec<u8>> {
    let path = self.path_for(id.as_str())?;
    Ok(tokio::fs::read(path).await?)
  }

  async fn create(&self, name: &str, body: Vec<u8>) -> Result<BlobId> {
    let path = self.path_for(name)?;
    self.write_atomic(path, body).await?;
    Ok(BlobId::new(name))
  }

  async fn update(&self, id: &BlobId, body: Vec<u8>) -> Result<()> {
    let path = self.path_for(id.as_str())?;
    self.write_atomic(path, body).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn create_find_update_download() {
    let dir = tempfile::tempdir().unwrap();
    let blobs = FsBlobStore::new(dir.path());

    assert!(blobs.find("backup.json").await.unwrap().is_none());

    let id = blobs.create("backup.json", b"one".to_vec()).await.unwrap();
    assert_eq!(blobs.find("backup.json").await.unwrap(), Some(id.clone()));
    assert_eq!(blobs.download(&id).await.unwrap(), b"one");

    blobs.update(&id, b"two".to_vec()).await.unwrap();
    assert_eq!(blobs.download(&id).await.unwrap(), b"two");
  }

  #[tokio::test]
  async fn creates_missing_root() {
    let dir = tempfile::tempdir().unwrap();
    let blobs = FsBlobStore::new(dir.path().join("nested/backups"));

    blobs.create("b.json", b"{}".to_vec()).await.unwrap();
    assert!(blobs.find("b.json").await.unwrap().is_some());
  }

  #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
  async fn concurrent_updates_all_succeed() {
    let dir = tempfile::tempdir().unwrap();
    let blobs = std::sync::Arc::new(FsBlobStore::new(dir.path()));
    let id = blobs.create("backup.json", b"seed".to_vec()).await.unwrap();

    let bodies: Vec<Vec<u8>> = (0..8u8).map(|i| vec![b'a' + i; 64 * 1024]).collect();
    let handles: Vec<_> = bodies
      .iter()
      .cloned()
      .map(|body| {
        let blobs = blobs.clone();
        let id = id.clone();
        tokio::spawn(async move { blobs.update(&id, body).await })
      })
      .collect();
    for h in handles {
      h.await.unwrap().unwrap();
    }

    let stored = blobs.download(&id).await.unwrap();
    assert!(bodies.contains(&stored));
    let entries = std::fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(entries, 1, "temporary files left behind");
  }

  #[tokio::test]
  async fn rejects_path_traversal() {
    let dir = tempfile::tempdir().unwrap();
    let blobs = FsBlobStore::new(dir.path());

    let err = blobs.create("../escape.json", Vec::new()).await.unwrap_err();
    assert!(matches!(err, Error::ExternalService(_)));
  }
}
