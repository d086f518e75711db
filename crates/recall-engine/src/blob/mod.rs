//! Remote object storage for backups.
//!
//! A [`BlobStore`] holds named objects. Backups use a single well-known name
//! and overwrite it on every sync.

pub mod drive;
pub mod fs;

use std::{fmt, future::Future};

pub use drive::DriveBlobStore;
pub use fs::FsBlobStore;

/// Backend-specific handle to a stored object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlobId(String);

impl BlobId {
  pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for BlobId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// Minimal object-store operations used by backup and restore.
pub trait BlobStore: Send + Sync {
  /// Look up an object by name. `None` if it does not exist.
  fn find<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = crate::Result<Option<BlobId>>> + Send + 'a;

  fn download<'a>(
    &'a self,
    id: &'a BlobId,
  ) -> impl Future<Output = crate::Result<Vec<u8>>> + Send + 'a;

  /// Create a new object named `name`.
  fn create<'a>(
    &'a self,
    name: &'a str,
    body: Vec<u8>,
  ) -> impl Future<Output = crate::Result<BlobId>> + Send + 'a;

  /// Replace the contents of an existing object.
  fn update<'a>(
    &'a self,
    id: &'a BlobId,
    body: Vec<u8>,
  ) -> impl Future<Output = crate::Result<()>> + Send + 'a;
}

/// Runtime-selected blob backend.
pub enum AnyBlobStore {
  Drive(DriveBlobStore),
  Fs(FsBlobStore),
}

impl BlobStore for AnyBlobStore {
  async fn find(&self, name: &str) -> crate::Result<Option<BlobId>> {
    match self {
      Self::Drive(b) => b.find(name).await,
      Self::Fs(b) => b.find(name).await,
    }
  }

  async fn download(&self, id: &BlobId) -> crate::Result<Vec<u8>> {
    match self {
      Self::Drive(b) => b.download(id).await,
      Self::Fs(b) => b.download(id).await,
    }
  }

  async fn create(&self, name: &str, body: Vec<u8>) -> crate::Result<BlobId> {
    match self {
      Self::Drive(b) => b.create(name, body).await,
      Self::Fs(b) => b.create(name, body).await,
    }
  }

  async fn update(&self, id: &BlobId, body: Vec<u8>) -> crate::Result<()> {
    match self {
      Self::Drive(b) => b.update(id, body).await,
      Self::Fs(b) => b.update(id, body).await,
    }
  }
}
