//! Server configuration, deserialised from `config.toml` and the environment.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use recall_engine::{
  MemoryConfig,
  blob::{AnyBlobStore, DriveBlobStore, FsBlobStore},
  model::{GeminiClient, GeminiConfig},
};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
  #[serde(default)]
  pub memory:     MemoryConfig,
  /// Summarization is disabled when absent.
  #[serde(default)]
  pub model:      Option<GeminiConfig>,
  #[serde(default)]
  pub backup:     BackupConfig,
}

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("memory.db") }

/// Where backups go.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupKind {
  #[default]
  None,
  Drive,
  Fs,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BackupConfig {
  #[serde(default)]
  pub kind:         BackupKind,
  /// Bearer token for `kind = "drive"`.
  pub access_token: Option<String>,
  /// Target directory for `kind = "fs"`.
  pub directory:    Option<PathBuf>,
}

impl ServerConfig {
  /// Layer the optional TOML file under `RECALL__*` environment variables.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("RECALL")
          .separator("__")
          .try_parsing(true),
      )
      .build()
      .context("failed to read config file")?;

    settings
      .try_deserialize()
      .context("failed to deserialise ServerConfig")
  }

  pub fn model_client(&self) -> anyhow::Result<Option<GeminiClient>> {
    let Some(cfg) = &self.model else {
      return Ok(None);
    };
    let client = GeminiClient::new(cfg.clone()).context("failed to build model client")?;
    Ok(Some(client))
  }
}

impl BackupConfig {
  pub fn blob_store(&self) -> anyhow::Result<Option<AnyBlobStore>> {
    match self.kind {
      BackupKind::None => Ok(None),
      BackupKind::Drive => {
        let token = self
          .access_token
          .clone()
          .context("backup.access_token is required for drive backups")?;
        let drive = DriveBlobStore::new(token).context("failed to build drive client")?;
        Ok(Some(AnyBlobStore::Drive(drive)))
      }
      BackupKind::Fs => {
        let dir = self
          .directory
          .as_deref()
          .context("backup.directory is required for fs backups")?;
        Ok(Some(AnyBlobStore::Fs(FsBlobStore::new(expand_tilde(dir)))))
      }
    }
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn parse(toml: &str) -> ServerConfig {
    config::Config::builder()
      .add_source(config::File::from_str(toml, config::FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap()
  }

  #[test]
  fn empty_file_uses_defaults() {
    let cfg = parse("");
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.memory.history_window, 50);
    assert_eq!(cfg.memory.backup_interval_secs, 300);
    assert!(cfg.model.is_none());
    assert_eq!(cfg.backup.kind, BackupKind::None);
    assert!(cfg.backup.blob_store().unwrap().is_none());
  }

  #[test]
  fn partial_memory_table_keeps_other_defaults() {
    let cfg = parse("[memory]\nhistory_window = 10\n");
    assert_eq!(cfg.memory.history_window, 10);
    assert_eq!(cfg.memory.summary_window, 20);
    assert_eq!(cfg.memory.backup_object_name, "autominds_voice_memory.json");
  }

  #[test]
  fn model_section_fills_defaults() {
    let cfg = parse("[model]\napi_key = \"k\"\n");
    let model = cfg.model.unwrap();
    assert_eq!(model.api_key, "k");
    assert_eq!(model.model, "gemini-2.0-flash-exp");
  }

  #[test]
  fn drive_backup_requires_token() {
    let cfg = parse("[backup]\nkind = \"drive\"\n");
    assert!(cfg.backup.blob_store().is_err());
  }

  #[test]
  fn fs_backup_builds_store() {
    let cfg = parse("[backup]\nkind = \"fs\"\ndirectory = \"/tmp/recall\"\n");
    assert!(matches!(cfg.backup.blob_store().unwrap(), Some(AnyBlobStore::Fs(_))));
  }

  #[test]
  fn tilde_is_expanded() {
    let expanded = expand_tilde(Path::new("~/x.db"));
    if let Ok(home) = std::env::var("HOME") {
      assert_eq!(expanded, PathBuf::from(home).join("x.db"));
    }
    assert_eq!(expand_tilde(Path::new("/abs.db")), PathBuf::from("/abs.db"));
  }
}
