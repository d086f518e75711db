//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. Roles and categories use
//! their lowercase discriminants.

use chrono::{DateTime, Utc};
use recall_core::{
  Identity,
  fact::Fact,
  message::Message,
  summary::Summary,
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Counts ──────────────────────────────────────────────────────────────────

pub fn encode_count(n: u64) -> i64 { i64::try_from(n).unwrap_or(i64::MAX) }

pub fn decode_count(n: i64) -> u64 { u64::try_from(n).unwrap_or(0) }

// ─── Raw row types ───────────────────────────────────────────────────────────

/// A `messages` row as read from SQLite, before decoding.
pub struct RawMessage {
  pub id:        i64,
  pub identity:  String,
  pub role:      String,
  pub content:   String,
  pub timestamp: String,
}

impl RawMessage {
  pub const COLUMNS: &'static str = "id, identity, role, content, timestamp";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:        row.get(0)?,
      identity:  row.get(1)?,
      role:      row.get(2)?,
      content:   row.get(3)?,
      timestamp: row.get(4)?,
    })
  }

  pub fn into_message(self) -> Result<Message> {
    Ok(Message {
      id:        self.id,
      identity:  Identity::new(self.identity),
      role:      self.role.parse()?,
      content:   self.content,
      timestamp: decode_dt(&self.timestamp)?,
    })
  }
}

/// A `facts` row as read from SQLite, before decoding.
pub struct RawFact {
  pub id:        i64,
  pub identity:  String,
  pub fact:      String,
  pub category:  String,
  pub timestamp: String,
}

impl RawFact {
  pub const COLUMNS: &'static str = "id, identity, fact, category, timestamp";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:        row.get(0)?,
      identity:  row.get(1)?,
      fact:      row.get(2)?,
      category:  row.get(3)?,
      timestamp: row.get(4)?,
    })
  }

  pub fn into_fact(self) -> Result<Fact> {
    Ok(Fact {
      id:        self.id,
      identity:  Identity::new(self.identity),
      fact:      self.fact,
      category:  self.category.parse()?,
      timestamp: decode_dt(&self.timestamp)?,
    })
  }
}

/// A `summaries` row as read from SQLite, before decoding.
pub struct RawSummary {
  pub id:            i64,
  pub identity:      String,
  pub summary:       String,
  pub message_count: i64,
  pub timestamp:     String,
}

impl RawSummary {
  pub const COLUMNS: &'static str = "id, identity, summary, message_count, timestamp";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get(0)?,
      identity:      row.get(1)?,
      summary:       row.get(2)?,
      message_count: row.get(3)?,
      timestamp:     row.get(4)?,
    })
  }

  pub fn into_summary(self) -> Result<Summary> {
    Ok(Summary {
      id:            self.id,
      identity:      Identity::new(self.identity),
      summary:       self.summary,
      message_count: decode_count(self.message_count),
      timestamp:     decode_dt(&self.timestamp)?,
    })
  }
}
