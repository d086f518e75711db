//! Tunables for the memory pipeline.

use std::time::Duration;

use serde::Deserialize;

/// Window sizes, thresholds and backup settings.
///
/// Every field has a default, so an empty `[memory]` table is valid.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
  /// Recent messages rendered into the context bundle.
  pub history_window:           usize,
  /// Recent messages sent to the summarizer.
  pub summary_window:           usize,
  /// Conversations with fewer stored messages are not summarized.
  pub min_messages_for_summary: u64,
  /// Seconds between periodic backups.
  pub backup_interval_secs:     u64,
  /// Name of the remote backup object.
  pub backup_object_name:       String,
}

impl Default for MemoryConfig {
  fn default() -> Self {
    Self {
      history_window:           50,
      summary_window:           20,
      min_messages_for_summary: 4,
      backup_interval_secs:     300,
      backup_object_name:       "autominds_voice_memory.json".to_owned(),
    }
  }
}

impl MemoryConfig {
  pub fn backup_interval(&self) -> Duration {
    Duration::from_secs(self.backup_interval_secs)
  }
}
