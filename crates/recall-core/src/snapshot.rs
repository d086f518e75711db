//! Cross-identity snapshot used for disaster-recovery backup.
//!
//! The JSON layout keeps the field names of backups already sitting in the
//! remote object (`phone`, `memories`), so an older backup restores cleanly.
//! Row ids are not part of the snapshot: rows are listed in id order and get
//! fresh ids when replayed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Identity,
  fact::{Fact, FactCategory},
  message::{Message, Role},
  summary::Summary,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRow {
  #[serde(rename = "phone")]
  pub identity:  Identity,
  pub role:      Role,
  pub content:   String,
  pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactRow {
  #[serde(rename = "phone")]
  pub identity:  Identity,
  pub fact:      String,
  #[serde(default)]
  pub category:  FactCategory,
  pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRow {
  #[serde(rename = "phone")]
  pub identity:      Identity,
  pub summary:       String,
  #[serde(default)]
  pub message_count: u64,
  pub timestamp:     DateTime<Utc>,
}

impl From<Message> for MessageRow {
  fn from(m: Message) -> Self {
    Self {
      identity:  m.identity,
      role:      m.role,
      content:   m.content,
      timestamp: m.timestamp,
    }
  }
}

impl From<Fact> for FactRow {
  fn from(f: Fact) -> Self {
    Self {
      identity:  f.identity,
      fact:      f.fact,
      category:  f.category,
      timestamp: f.timestamp,
    }
  }
}

impl From<Summary> for SummaryRow {
  fn from(s: Summary) -> Self {
    Self {
      identity:      s.identity,
      summary:       s.summary,
      message_count: s.message_count,
      timestamp:     s.timestamp,
    }
  }
}

/// Every message, fact and summary in the store, each list in row-id order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
  #[serde(default)]
  pub messages:    Vec<MessageRow>,
  #[serde(default, rename = "memories")]
  pub facts:       Vec<FactRow>,
  #[serde(default)]
  pub summaries:   Vec<SummaryRow>,
  pub exported_at: DateTime<Utc>,
}

impl Snapshot {
  pub fn to_json_pretty(&self) -> crate::Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(self)?)
  }

  pub fn from_json(bytes: &[u8]) -> crate::Result<Self> {
    Ok(serde_json::from_slice(bytes)?)
  }
}

/// Row counts written by a snapshot import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
  pub messages:       usize,
  /// Facts actually inserted; duplicates of existing facts are not counted.
  pub facts_inserted: usize,
  pub summaries:      usize,
}
