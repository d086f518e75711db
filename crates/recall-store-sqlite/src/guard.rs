//! The lock that serialises every storage operation.

use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};

/// One mutex shared by every clone of a store.
///
/// Held for the whole of each database call, including multi-statement
/// transactions, and never while awaiting anything but the database.
#[derive(Clone, Default)]
pub(crate) struct ConcurrencyGuard {
  lock: Arc<Mutex<()>>,
}

impl ConcurrencyGuard {
  pub(crate) async fn acquire(&self) -> MutexGuard<'_, ()> { self.lock.lock().await }
}
