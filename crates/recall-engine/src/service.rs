//! [`MemoryService`]: the operations the call-handling layer drives.
//!
//! Failures never escape as hard errors from the turn operations: storage
//! problems during a live turn degrade to [`TurnOutcome::Degraded`] or an
//! empty context, and summarization or backup problems are logged and
//! dropped until the next scheduled attempt.

use recall_core::{
  Identity,
  fact::{Fact, FactCategory},
  message::{Message, Role},
  snapshot::Snapshot,
  store::MemoryStore,
};
use serde::Serialize;

use crate::{
  Error, MemoryConfig, Result,
  backup::{BackupSync, RestoreOutcome, SyncOutcome},
  blob::BlobStore,
  context::{ContextAssembler, ContextBundle},
  extractor::FactExtractor,
  model::ModelClient,
  summarizer::{Summarizer, SummaryOutcome},
};

/// Messages included in [`MemoryStats::last_messages`].
const STATS_TAIL: usize = 5;

/// Whether a turn made it into the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TurnOutcome {
  Recorded {
    /// Category of the fact extracted from a user turn, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    fact: Option<FactCategory>,
  },
  /// The store failed; the conversation should carry on regardless.
  Degraded,
}

/// Result of [`MemoryService::end_conversation`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationEnd {
  pub summary: SummaryOutcome,
  /// `None` when the backup failed.
  pub backup:  Option<SyncOutcome>,
}

/// Per-identity memory overview.
#[derive(Debug, Clone, Serialize)]
pub struct MemoryStats {
  pub identity:               Identity,
  pub total_messages:         u64,
  pub long_term_memories:     usize,
  pub conversation_summaries: usize,
  pub memories:               Vec<Fact>,
  pub last_messages:          Vec<Message>,
}

pub struct MemoryService<S, M, B> {
  store:      S,
  model:      Option<M>,
  backup:     BackupSync<B>,
  extractor:  FactExtractor,
  assembler:  ContextAssembler,
  summarizer: Summarizer,
  config:     MemoryConfig,
}

impl<S, M, B> MemoryService<S, M, B>
where
  S: MemoryStore,
  M: ModelClient,
  B: BlobStore,
{
  pub fn new(store: S, model: Option<M>, blob: Option<B>, config: MemoryConfig) -> Self {
    Self {
      backup: BackupSync::new(blob, config.backup_object_name.clone()),
      extractor: FactExtractor,
      assembler: ContextAssembler::new(config.history_window),
      summarizer: Summarizer::new(config.summary_window, config.min_messages_for_summary),
      store,
      model,
      config,
    }
  }

  pub fn store(&self) -> &S { &self.store }

  pub fn config(&self) -> &MemoryConfig { &self.config }

  // ── Turns ─────────────────────────────────────────────────────────────────

  /// Store a user utterance and extract a fact from it.
  pub async fn record_user_turn(&self, identity: &Identity, text: &str) -> TurnOutcome {
    if let Err(e) = self.store.append_message(identity, Role::User, text).await {
      tracing::error!(%identity, error = %e, "failed to store user turn");
      return TurnOutcome::Degraded;
    }

    let fact = match self.extractor.extract(&self.store, identity, text).await {
      Ok(category) => category,
      Err(e) => {
        tracing::warn!(%identity, error = %e, "fact extraction failed");
        None
      }
    };

    TurnOutcome::Recorded { fact }
  }

  pub async fn record_assistant_turn(&self, identity: &Identity, text: &str) -> TurnOutcome {
    match self.store.append_message(identity, Role::Assistant, text).await {
      Ok(_) => TurnOutcome::Recorded { fact: None },
      Err(e) => {
        tracing::error!(%identity, error = %e, "failed to store assistant turn");
        TurnOutcome::Degraded
      }
    }
  }

  /// Summarize the conversation, then back up the whole store.
  pub async fn end_conversation(&self, identity: &Identity) -> ConversationEnd {
    let summary = self
      .summarizer
      .summarize(&self.store, self.model.as_ref(), identity)
      .await;

    let backup = match self.sync_to_remote().await {
      Ok(outcome) => Some(outcome),
      Err(e) => {
        tracing::warn!(%identity, error = %e, "post-conversation backup failed");
        None
      }
    };

    ConversationEnd { summary, backup }
  }

  // ── Context ───────────────────────────────────────────────────────────────

  /// Render memory for the response generator. Falls back to an empty bundle
  /// if the store cannot be read.
  pub async fn build_context(&self, identity: &Identity) -> ContextBundle {
    match self.assembler.assemble(&self.store, identity).await {
      Ok(bundle) => bundle,
      Err(e) => {
        tracing::error!(%identity, error = %e, "failed to assemble context");
        ContextBundle::default()
      }
    }
  }

  // ── Inspection ────────────────────────────────────────────────────────────

  pub async fn stats(&self, identity: &Identity) -> Result<MemoryStats> {
    let total_messages = self.store.count_messages(identity).await.map_err(Error::storage)?;
    let memories = self.store.list_facts(identity).await.map_err(Error::storage)?;
    let summaries = self.store.list_summaries(identity).await.map_err(Error::storage)?;
    let last_messages = self
      .store
      .recent_messages(identity, STATS_TAIL)
      .await
      .map_err(Error::storage)?;

    Ok(MemoryStats {
      identity: identity.clone(),
      total_messages,
      long_term_memories: memories.len(),
      conversation_summaries: summaries.len(),
      memories,
      last_messages,
    })
  }

  pub async fn identities(&self) -> Result<Vec<Identity>> {
    self.store.identities().await.map_err(Error::storage)
  }

  // ── Backup ────────────────────────────────────────────────────────────────

  pub async fn export(&self) -> Result<Snapshot> { self.backup.export(&self.store).await }

  pub async fn sync_to_remote(&self) -> Result<SyncOutcome> {
    self.backup.sync_to_remote(&self.store).await
  }

  /// Restore from the remote backup. Call once, before serving traffic.
  pub async fn sync_from_remote(&self) -> Result<RestoreOutcome> {
    self.backup.sync_from_remote(&self.store).await
  }
}
