//! The `MemoryStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `recall-store-sqlite`).
//! Higher layers (`recall-engine`, `recall-api`) depend on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use crate::{
  Identity,
  fact::{Fact, FactCategory},
  message::{Message, Role},
  snapshot::{ImportReport, Snapshot},
  summary::Summary,
};

/// Abstraction over a Recall storage backend.
///
/// Messages and summaries are append-only. Facts are insert-if-absent on the
/// `(identity, fact)` pair. Implementations must serialise every operation
/// through a single lock so that each call is atomic with respect to every
/// other call in the process.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait MemoryStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Message log ───────────────────────────────────────────────────────

  /// Append a turn. The id and timestamp are assigned by the store.
  fn append_message<'a>(
    &'a self,
    identity: &'a Identity,
    role: Role,
    content: &'a str,
  ) -> impl Future<Output = Result<Message, Self::Error>> + Send + 'a;

  /// The most recent `limit` messages, oldest first.
  fn recent_messages<'a>(
    &'a self,
    identity: &'a Identity,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<Message>, Self::Error>> + Send + 'a;

  /// Every message for `identity`, oldest first.
  fn all_messages<'a>(
    &'a self,
    identity: &'a Identity,
  ) -> impl Future<Output = Result<Vec<Message>, Self::Error>> + Send + 'a;

  fn count_messages<'a>(
    &'a self,
    identity: &'a Identity,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  // ── Facts ─────────────────────────────────────────────────────────────

  /// Record a fact unless the `(identity, fact)` pair already exists.
  ///
  /// Returns `true` if a row was inserted. A duplicate is not an error.
  fn record_fact<'a>(
    &'a self,
    identity: &'a Identity,
    fact: &'a str,
    category: FactCategory,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// All facts for `identity` in insertion order.
  fn list_facts<'a>(
    &'a self,
    identity: &'a Identity,
  ) -> impl Future<Output = Result<Vec<Fact>, Self::Error>> + Send + 'a;

  // ── Summaries ─────────────────────────────────────────────────────────

  /// Append a summary. Never overwrites an earlier one.
  fn record_summary<'a>(
    &'a self,
    identity: &'a Identity,
    summary: &'a str,
    message_count: u64,
  ) -> impl Future<Output = Result<Summary, Self::Error>> + Send + 'a;

  /// All summaries for `identity` in insertion order.
  fn list_summaries<'a>(
    &'a self,
    identity: &'a Identity,
  ) -> impl Future<Output = Result<Vec<Summary>, Self::Error>> + Send + 'a;

  // ── Whole-store operations ────────────────────────────────────────────

  /// Every identity that has at least one message, fact or summary.
  fn identities(
    &self,
  ) -> impl Future<Output = Result<Vec<Identity>, Self::Error>> + Send + '_;

  /// Export every row of every identity, stamped with the export time.
  fn export_snapshot(
    &self,
  ) -> impl Future<Output = Result<Snapshot, Self::Error>> + Send + '_;

  /// Replay a snapshot.
  ///
  /// Message and summary rows are appended unconditionally, so importing the
  /// same snapshot twice duplicates them. Fact rows go through the
  /// insert-if-absent rule and are safe to replay.
  fn import_snapshot<'a>(
    &'a self,
    snapshot: &'a Snapshot,
  ) -> impl Future<Output = Result<ImportReport, Self::Error>> + Send + 'a;
}
