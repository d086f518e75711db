//! Error type for `recall-engine`.
//!
//! The variants follow the failure policy of the pipeline: storage errors
//! propagate to the caller of the failing operation, while external-service
//! and parse errors are caught where the call is made and logged.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The local store failed.
  #[error("storage error: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

  /// A model or remote-object call failed.
  #[error("external service error: {0}")]
  ExternalService(String),

  /// A structured response (model output, snapshot) could not be parsed.
  #[error("parse error: {0}")]
  Parse(#[from] serde_json::Error),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

impl Error {
  pub fn storage(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Storage(Box::new(e))
  }
}

impl From<reqwest::Error> for Error {
  fn from(e: reqwest::Error) -> Self { Self::ExternalService(e.to_string()) }
}

impl From<recall_core::Error> for Error {
  fn from(e: recall_core::Error) -> Self {
    match e {
      recall_core::Error::Serialization(e) => Self::Parse(e),
      other => Self::Storage(Box::new(other)),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
