//! Compressed conversation summaries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Identity;

/// A summary written at the end of a conversation.
///
/// Summaries accumulate; nothing is ever overwritten. `message_count` is the
/// identity's total message count when the summary was produced, so it may
/// lag behind the current total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
  pub id:            i64,
  pub identity:      Identity,
  pub summary:       String,
  pub message_count: u64,
  pub timestamp:     DateTime<Utc>,
}
