//! Identity, the opaque key that partitions every record.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A stable caller key, typically an E.164 phone number.
///
/// Identities are never stored on their own; they only exist as the partition
/// column of messages, facts and summaries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
  pub fn new(key: impl Into<String>) -> Self { Self(key.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for Identity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for Identity {
  fn from(s: &str) -> Self { Self(s.to_owned()) }
}

impl From<String> for Identity {
  fn from(s: String) -> Self { Self(s) }
}
