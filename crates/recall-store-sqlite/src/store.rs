//! [`SqliteStore`]: the SQLite implementation of [`MemoryStore`].

use std::path::Path;

use chrono::Utc;
use recall_core::{
  Identity,
  fact::{Fact, FactCategory},
  message::{Message, Role},
  snapshot::{FactRow, ImportReport, MessageRow, Snapshot, SummaryRow},
  store::MemoryStore,
  summary::Summary,
};

use crate::{
  Result,
  encode::{RawFact, RawMessage, RawSummary, decode_count, encode_count, encode_dt},
  guard::ConcurrencyGuard,
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Recall memory store backed by a single SQLite file.
///
/// Cloning is cheap. The inner connection and the lock are
/// reference-counted, and every clone shares the same lock.
#[derive(Clone)]
pub struct SqliteStore {
  conn:  tokio_rusqlite::Connection,
  guard: ConcurrencyGuard,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn, guard: ConcurrencyGuard::default() };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn, guard: ConcurrencyGuard::default() };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await
  }

  /// Run `function` on the database thread while holding the store lock.
  async fn call<F, R>(&self, function: F) -> Result<R>
  where
    F: FnOnce(&mut rusqlite::Connection) -> tokio_rusqlite::Result<R>
      + Send
      + 'static,
    R: Send + 'static,
  {
    let _held = self.guard.acquire().await;
    Ok(self.conn.call(function).await?)
  }

  async fn select_messages(
    &self,
    sql: &'static str,
    identity: &Identity,
    limit: Option<usize>,
  ) -> Result<Vec<Message>> {
    let identity = identity.as_str().to_owned();
    let limit    = limit.map(|l| i64::try_from(l).unwrap_or(i64::MAX));

    let raws: Vec<RawMessage> = self
      .call(move |conn| {
        let mut stmt = conn.prepare(sql)?;
        let rows = match limit {
          Some(l) => stmt
            .query_map(rusqlite::params![identity, l], RawMessage::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?,
          None => stmt
            .query_map(rusqlite::params![identity], RawMessage::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?,
        };
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMessage::into_message).collect()
  }
}

// ─── MemoryStore impl ────────────────────────────────────────────────────────

impl MemoryStore for SqliteStore {
  type Error = crate::Error;

  // ── Message log ───────────────────────────────────────────────────────────

  async fn append_message(
    &self,
    identity: &Identity,
    role:     Role,
    content:  &str,
  ) -> Result<Message> {
    let timestamp    = Utc::now();
    let identity_str = identity.as_str().to_owned();
    let role_str     = role.as_str();
    let content_str  = content.to_owned();
    let at_str       = encode_dt(timestamp);

    let id = self
      .call(move |conn| {
        conn.execute(
          "INSERT INTO messages (identity, role, content, timestamp)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![identity_str, role_str, content_str, at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Message {
      id,
      identity: identity.clone(),
      role,
      content: content.to_owned(),
      timestamp,
    })
  }

  async fn recent_messages(
    &self,
    identity: &Identity,
    limit:    usize,
  ) -> Result<Vec<Message>> {
    let sql = "SELECT id, identity, role, content, timestamp FROM messages
               WHERE identity = ?1 ORDER BY id DESC LIMIT ?2";
    let mut messages = self.select_messages(sql, identity, Some(limit)).await?;
    // Newest-first from SQL; callers want oldest first.
    messages.reverse();
    Ok(messages)
  }

  async fn all_messages(&self, identity: &Identity) -> Result<Vec<Message>> {
    let sql = "SELECT id, identity, role, content, timestamp FROM messages
               WHERE identity = ?1 ORDER BY id";
    self.select_messages(sql, identity, None).await
  }

  async fn count_messages(&self, identity: &Identity) -> Result<u64> {
    let identity_str = identity.as_str().to_owned();

    let count: i64 = self
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM messages WHERE identity = ?1",
          rusqlite::params![identity_str],
          |r| r.get(0),
        )?)
      })
      .await?;

    Ok(decode_count(count))
  }

  // ── Facts ─────────────────────────────────────────────────────────────────

  async fn record_fact(
    &self,
    identity: &Identity,
    fact:     &str,
    category: FactCategory,
  ) -> Result<bool> {
    let identity_str = identity.as_str().to_owned();
    let fact_str     = fact.to_owned();
    let category_str = category.as_str();
    let at_str       = encode_dt(Utc::now());

    let inserted = self
      .call(move |conn| {
        let changed = conn.execute(
          "INSERT OR IGNORE INTO facts (identity, fact, category, timestamp)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![identity_str, fact_str, category_str, at_str],
        )?;
        Ok(changed > 0)
      })
      .await?;

    Ok(inserted)
  }

  async fn list_facts(&self, identity: &Identity) -> Result<Vec<Fact>> {
    let identity_str = identity.as_str().to_owned();

    let raws: Vec<RawFact> = self
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT id, identity, fact, category, timestamp FROM facts
           WHERE identity = ?1 ORDER BY id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![identity_str], RawFact::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawFact::into_fact).collect()
  }

  // ── Summaries ─────────────────────────────────────────────────────────────

  async fn record_summary(
    &self,
    identity:      &Identity,
    summary:       &str,
    message_count: u64,
  ) -> Result<Summary> {
    let timestamp    = Utc::now();
    let identity_str = identity.as_str().to_owned();
    let summary_str  = summary.to_owned();
    let count        = encode_count(message_count);
    let at_str       = encode_dt(timestamp);

    let id = self
      .call(move |conn| {
        conn.execute(
          "INSERT INTO summaries (identity, summary, message_count, timestamp)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![identity_str, summary_str, count, at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Summary {
      id,
      identity: identity.clone(),
      summary: summary.to_owned(),
      message_count,
      timestamp,
    })
  }

  async fn list_summaries(&self, identity: &Identity) -> Result<Vec<Summary>> {
    let identity_str = identity.as_str().to_owned();

    let raws: Vec<RawSummary> = self
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT id, identity, summary, message_count, timestamp FROM summaries
           WHERE identity = ?1 ORDER BY id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![identity_str], RawSummary::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSummary::into_summary).collect()
  }

  // ── Whole-store operations ────────────────────────────────────────────────

  async fn identities(&self) -> Result<Vec<Identity>> {
    let keys: Vec<String> = self
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT identity FROM messages
           UNION SELECT identity FROM facts
           UNION SELECT identity FROM summaries
           ORDER BY identity",
        )?;
        let rows = stmt
          .query_map([], |r| r.get(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(keys.into_iter().map(Identity::new).collect())
  }

  async fn export_snapshot(&self) -> Result<Snapshot> {
    // One lock acquisition so the three tables are read consistently.
    let (raw_messages, raw_facts, raw_summaries) = self
      .call(|conn| {
        let messages = conn
          .prepare(&format!("SELECT {} FROM messages ORDER BY id", RawMessage::COLUMNS))?
          .query_map([], RawMessage::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        let facts = conn
          .prepare(&format!("SELECT {} FROM facts ORDER BY id", RawFact::COLUMNS))?
          .query_map([], RawFact::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        let summaries = conn
          .prepare(&format!("SELECT {} FROM summaries ORDER BY id", RawSummary::COLUMNS))?
          .query_map([], RawSummary::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok((messages, facts, summaries))
      })
      .await?;

    let messages = raw_messages
      .into_iter()
      .map(|r| r.into_message().map(MessageRow::from))
      .collect::<Result<Vec<_>>>()?;
    let facts = raw_facts
      .into_iter()
      .map(|r| r.into_fact().map(FactRow::from))
      .collect::<Result<Vec<_>>>()?;
    let summaries = raw_summaries
      .into_iter()
      .map(|r| r.into_summary().map(SummaryRow::from))
      .collect::<Result<Vec<_>>>()?;

    Ok(Snapshot { messages, facts, summaries, exported_at: Utc::now() })
  }

  async fn import_snapshot(&self, snapshot: &Snapshot) -> Result<ImportReport> {
    let messages: Vec<(String, &'static str, String, String)> = snapshot
      .messages
      .iter()
      .map(|m| {
        (
          m.identity.as_str().to_owned(),
          m.role.as_str(),
          m.content.clone(),
          encode_dt(m.timestamp),
        )
      })
      .collect();
    let facts: Vec<(String, String, &'static str, String)> = snapshot
      .facts
      .iter()
      .map(|f| {
        (
          f.identity.as_str().to_owned(),
          f.fact.clone(),
          f.category.as_str(),
          encode_dt(f.timestamp),
        )
      })
      .collect();
    let summaries: Vec<(String, String, i64, String)> = snapshot
      .summaries
      .iter()
      .map(|s| {
        (
          s.identity.as_str().to_owned(),
          s.summary.clone(),
          encode_count(s.message_count),
          encode_dt(s.timestamp),
        )
      })
      .collect();

    let report = self
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut report = ImportReport::default();

        {
          let mut insert_message = tx.prepare(
            "INSERT INTO messages (identity, role, content, timestamp)
             VALUES (?1, ?2, ?3, ?4)",
          )?;
          for (identity, role, content, at) in &messages {
            insert_message.execute(rusqlite::params![identity, role, content, at])?;
            report.messages += 1;
          }

          let mut insert_fact = tx.prepare(
            "INSERT OR IGNORE INTO facts (identity, fact, category, timestamp)
             VALUES (?1, ?2, ?3, ?4)",
          )?;
          for (identity, fact, category, at) in &facts {
            report.facts_inserted +=
              insert_fact.execute(rusqlite::params![identity, fact, category, at])?;
          }

          let mut insert_summary = tx.prepare(
            "INSERT INTO summaries (identity, summary, message_count, timestamp)
             VALUES (?1, ?2, ?3, ?4)",
          )?;
          for (identity, summary, count, at) in &summaries {
            insert_summary.execute(rusqlite::params![identity, summary, count, at])?;
            report.summaries += 1;
          }
        }

        tx.commit()?;
        Ok(report)
      })
      .await?;

    tracing::debug!(
      messages = report.messages,
      facts = report.facts_inserted,
      summaries = report.summaries,
      "snapshot imported"
    );

    Ok(report)
  }
}
