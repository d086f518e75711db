//! Snapshot backup to, and restore from, a single remote object.
//!
//! The whole store is exported as one JSON document and written to a
//! well-known object name, overwriting the previous backup. Restore happens
//! once, at startup, before any traffic is served; a second restore in the
//! same process is refused. There is no merge: the last writer wins.
//!
//! Reading and writing the store happen under the store lock; the remote
//! calls happen after it is released. Syncs are serialised by a lock of
//! their own, so a periodic tick and a conversation-end backup never race on
//! the same object.

use std::{
  sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
  },
  time::Duration,
};

use recall_core::{
  snapshot::{ImportReport, Snapshot},
  store::MemoryStore,
};
use serde::Serialize;
use tokio::{
  sync::Mutex,
  task::JoinHandle,
  time::{Instant, MissedTickBehavior},
};

use crate::{
  Error, Result,
  blob::BlobStore,
  model::ModelClient,
  service::MemoryService,
};

/// Result of a [`BackupSync::sync_to_remote`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
  /// No blob store configured.
  Skipped,
  Created,
  Updated,
}

/// Result of a [`BackupSync::sync_from_remote`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
  /// No blob store configured.
  Skipped,
  /// A restore was already attempted in this process.
  AlreadyRestored,
  /// No backup object exists; the store is left untouched.
  NotFound,
  Restored(ImportReport),
}

pub struct BackupSync<B> {
  blob:        Option<B>,
  object_name: String,
  restored:    AtomicBool,
  /// Held from export until the remote write completes.
  sync_lock:   Mutex<()>,
}

impl<B: BlobStore> BackupSync<B> {
  pub fn new(blob: Option<B>, object_name: impl Into<String>) -> Self {
    Self {
      blob,
      object_name: object_name.into(),
      restored: AtomicBool::new(false),
      sync_lock: Mutex::new(()),
    }
  }

  #[cfg(test)]
  pub(crate) fn blob(&self) -> Option<&B> { self.blob.as_ref() }

  pub async fn export<S: MemoryStore>(&self, store: &S) -> Result<Snapshot> {
    store.export_snapshot().await.map_err(Error::storage)
  }

  pub async fn import<S: MemoryStore>(
    &self,
    store: &S,
    snapshot: &Snapshot,
  ) -> Result<ImportReport> {
    store.import_snapshot(snapshot).await.map_err(Error::storage)
  }

  /// Export the store and overwrite the remote backup object, creating it if
  /// it does not exist yet.
  pub async fn sync_to_remote<S: MemoryStore>(&self, store: &S) -> Result<SyncOutcome> {
    let Some(blob) = &self.blob else {
      tracing::debug!("no blob store configured; skipping backup");
      return Ok(SyncOutcome::Skipped);
    };

    let _held = self.sync_lock.lock().await;
    let snapshot = self.export(store).await?;
    let body = snapshot.to_json_pretty()?;

    let outcome = match blob.find(&self.object_name).await? {
      Some(id) => {
        blob.update(&id, body).await?;
        SyncOutcome::Updated
      }
      None => {
        blob.create(&self.object_name, body).await?;
        SyncOutcome::Created
      }
    };

    tracing::info!(
      object = %self.object_name,
      messages = snapshot.messages.len(),
      facts = snapshot.facts.len(),
      summaries = snapshot.summaries.len(),
      ?outcome,
      "backup written"
    );
    Ok(outcome)
  }

  /// Download the remote backup, if any, and import it. Only the first call
  /// in a process does anything.
  pub async fn sync_from_remote<S: MemoryStore>(&self, store: &S) -> Result<RestoreOutcome> {
    let Some(blob) = &self.blob else {
      tracing::info!("no blob store configured; skipping restore");
      return Ok(RestoreOutcome::Skipped);
    };

    if self.restored.swap(true, Ordering::SeqCst) {
      tracing::warn!("restore already attempted in this process; ignoring");
      return Ok(RestoreOutcome::AlreadyRestored);
    }

    let _held = self.sync_lock.lock().await;

    let Some(id) = blob.find(&self.object_name).await? else {
      tracing::info!(object = %self.object_name, "no backup found; starting fresh");
      return Ok(RestoreOutcome::NotFound);
    };

    let body = blob.download(&id).await?;
    let snapshot = Snapshot::from_json(&body)?;
    let report = self.import(store, &snapshot).await?;

    tracing::info!(
      object = %self.object_name,
      messages = report.messages,
      facts = report.facts_inserted,
      summaries = report.summaries,
      "restored memory from backup"
    );
    Ok(RestoreOutcome::Restored(report))
  }
}

/// Run [`MemoryService::sync_to_remote`] every `period` for as long as the
/// returned task lives. The first backup happens one period after spawning.
/// Failures are logged and the next tick proceeds on schedule.
pub fn spawn_periodic_backup<S, M, B>(
  service: Arc<MemoryService<S, M, B>>,
  period: Duration,
) -> JoinHandle<()>
where
  S: MemoryStore + 'static,
  M: ModelClient + 'static,
  B: BlobStore + 'static,
{
  tokio::spawn(async move {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
      ticker.tick().await;
      if let Err(e) = service.sync_to_remote().await {
        tracing::warn!(error = %e, "periodic backup failed");
      }
    }
  })
}

#[cfg(test)]
mod tests {
  use recall_core::{Identity, fact::FactCategory, message::Role};
  use recall_store_sqlite::SqliteStore;

  use super::*;
  use crate::{blob::FsBlobStore, testing::MemoryBlobStore};

  const OBJECT: &str = "memory.json";

  async fn populated() -> SqliteStore {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let id = Identity::from("+1");
    store.append_message(&id, Role::User, "I love tea").await.unwrap();
    store.append_message(&id, Role::Assistant, "Noted").await.unwrap();
    store.record_fact(&id, "I love tea", FactCategory::Preference).await.unwrap();
    store.record_summary(&id, "tea", 2).await.unwrap();
    store
  }

  #[tokio::test]
  async fn first_sync_creates_then_updates() {
    let store = populated().await;
    let sync = BackupSync::new(Some(MemoryBlobStore::default()), OBJECT);

    assert_eq!(sync.sync_to_remote(&store).await.unwrap(), SyncOutcome::Created);
    assert_eq!(sync.sync_to_remote(&store).await.unwrap(), SyncOutcome::Updated);

    let blob = sync.blob.as_ref().unwrap();
    assert_eq!(blob.creates.load(Ordering::SeqCst), 1);
    assert_eq!(blob.updates.load(Ordering::SeqCst), 1);

    let snap = Snapshot::from_json(&blob.object(OBJECT).unwrap()).unwrap();
    assert_eq!(snap.messages.len(), 2);
    assert_eq!(snap.facts.len(), 1);
    assert_eq!(snap.summaries.len(), 1);
  }

  #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
  async fn concurrent_syncs_all_succeed() {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let id = Identity::from("+1");
    let padding = "x".repeat(4096);
    for i in 0..300 {
      store.append_message(&id, Role::User, &format!("{i} {padding}")).await.unwrap();
    }

    let dir = tempfile::tempdir().unwrap();
    let sync = Arc::new(BackupSync::new(Some(FsBlobStore::new(dir.path())), OBJECT));

    let mut created = 0;
    for _ in 0..10 {
      let handles: Vec<_> = (0..4)
        .map(|_| {
          let store = store.clone();
          let sync = sync.clone();
          tokio::spawn(async move { sync.sync_to_remote(store.as_ref()).await })
        })
        .collect();
      for h in handles {
        if h.await.unwrap().unwrap() == SyncOutcome::Created {
          created += 1;
        }
      }
    }
    assert_eq!(created, 1);

    let body = std::fs::read(dir.path().join(OBJECT)).unwrap();
    assert_eq!(Snapshot::from_json(&body).unwrap().messages.len(), 300);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
  }

  #[tokio::test]
  async fn restore_from_absent_object_leaves_store_empty() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let sync = BackupSync::new(Some(MemoryBlobStore::default()), OBJECT);

    let outcome = sync.sync_from_remote(&store).await.unwrap();
    assert_eq!(outcome, RestoreOutcome::NotFound);
    assert!(store.identities().await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn restore_imports_backup() {
    let source = populated().await;
    let body = source.export_snapshot().await.unwrap().to_json_pretty().unwrap();

    let store = SqliteStore::open_in_memory().await.unwrap();
    let sync = BackupSync::new(Some(MemoryBlobStore::with_object(OBJECT, body)), OBJECT);

    let outcome = sync.sync_from_remote(&store).await.unwrap();
    assert_eq!(
      outcome,
      RestoreOutcome::Restored(ImportReport { messages: 2, facts_inserted: 1, summaries: 1 })
    );
    assert_eq!(store.count_messages(&Identity::from("+1")).await.unwrap(), 2);
  }

  #[tokio::test]
  async fn restore_runs_once_per_process() {
    let source = populated().await;
    let body = source.export_snapshot().await.unwrap().to_json_pretty().unwrap();

    let store = SqliteStore::open_in_memory().await.unwrap();
    let sync = BackupSync::new(Some(MemoryBlobStore::with_object(OBJECT, body)), OBJECT);

    sync.sync_from_remote(&store).await.unwrap();
    let again = sync.sync_from_remote(&store).await.unwrap();

    assert_eq!(again, RestoreOutcome::AlreadyRestored);
    assert_eq!(store.count_messages(&Identity::from("+1")).await.unwrap(), 2);
  }

  #[tokio::test]
  async fn corrupt_backup_is_a_parse_error() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let blob = MemoryBlobStore::with_object(OBJECT, b"not json".to_vec());
    let sync = BackupSync::new(Some(blob), OBJECT);

    let err = sync.sync_from_remote(&store).await.unwrap_err();
    assert!(matches!(err, Error::Parse(_)));
    assert!(store.identities().await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn unconfigured_sync_is_skipped() {
    let store = populated().await;
    let sync: BackupSync<MemoryBlobStore> = BackupSync::new(None, OBJECT);

    assert_eq!(sync.sync_to_remote(&store).await.unwrap(), SyncOutcome::Skipped);
    assert_eq!(sync.sync_from_remote(&store).await.unwrap(), RestoreOutcome::Skipped);
  }

  #[tokio::test]
  async fn remote_failure_is_external_service_error() {
    let store = populated().await;
    let sync = BackupSync::new(Some(MemoryBlobStore::failing()), OBJECT);

    let err = sync.sync_to_remote(&store).await.unwrap_err();
    assert!(matches!(err, Error::ExternalService(_)));
  }
}
