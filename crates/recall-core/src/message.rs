//! Conversation turns.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Identity};

/// Who spoke a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  User,
  Assistant,
}

impl Role {
  /// The string stored in the `role` column.
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::User => "user",
      Self::Assistant => "assistant",
    }
  }

  /// Speaker label used when rendering a transcript for a model prompt.
  pub fn speaker_label(&self) -> &'static str {
    match self {
      Self::User => "User",
      Self::Assistant => "AI",
    }
  }
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Role {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "user" => Ok(Self::User),
      "assistant" => Ok(Self::Assistant),
      other => Err(Error::UnknownRole(other.to_owned())),
    }
  }
}

/// One stored turn. Immutable once written; the log is append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
  /// Monotonic row id assigned by the store.
  pub id:        i64,
  pub identity:  Identity,
  pub role:      Role,
  pub content:   String,
  /// Server-assigned timestamp.
  pub timestamp: DateTime<Utc>,
}

/// Render messages as `User: ...` / `AI: ...` lines, oldest first.
pub fn render_transcript(messages: &[Message]) -> String {
  messages
    .iter()
    .map(|m| format!("{}: {}", m.role.speaker_label(), m.content))
    .collect::<Vec<_>>()
    .join("\n")
}
