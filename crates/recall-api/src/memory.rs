//! Handlers for `/memory` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/memory/identities` | Every identity with stored memory |
//! | `GET`  | `/memory/stats` | `?identity` required; counts plus recent messages |
//! | `GET`  | `/memory/context` | `?identity` required; rendered [`ContextBundle`] |
//! | `GET`  | `/memory/export` | Full snapshot in the backup format |
//! | `POST` | `/memory/backup` | Writes the remote backup now |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use recall_core::{Identity, snapshot::Snapshot, store::MemoryStore};
use recall_engine::{
  MemoryService,
  backup::SyncOutcome,
  blob::BlobStore,
  context::ContextBundle,
  model::ModelClient,
  service::MemoryStats,
};
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, require_identity};

#[derive(Debug, Deserialize)]
pub struct IdentityParams {
  pub identity: Identity,
}

// ─── Identities ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct IdentitiesResponse {
  pub identities: Vec<Identity>,
}

/// `GET /memory/identities`
pub async fn identities<S, M, B>(
  State(service): State<Arc<MemoryService<S, M, B>>>,
) -> Result<Json<IdentitiesResponse>, ApiError>
where
  S: MemoryStore,
  M: ModelClient,
  B: BlobStore,
{
  let identities = service.identities().await?;
  Ok(Json(IdentitiesResponse { identities }))
}

// ─── Stats ────────────────────────────────────────────────────────────────────

/// `GET /memory/stats?identity=<id>`
pub async fn stats<S, M, B>(
  State(service): State<Arc<MemoryService<S, M, B>>>,
  Query(params): Query<IdentityParams>,
) -> Result<Json<MemoryStats>, ApiError>
where
  S: MemoryStore,
  M: ModelClient,
  B: BlobStore,
{
  require_identity(&params.identity)?;
  Ok(Json(service.stats(&params.identity).await?))
}

// ─── Context ──────────────────────────────────────────────────────────────────

/// `GET /memory/context?identity=<id>`
pub async fn context<S, M, B>(
  State(service): State<Arc<MemoryService<S, M, B>>>,
  Query(params): Query<IdentityParams>,
) -> Result<Json<ContextBundle>, ApiError>
where
  S: MemoryStore,
  M: ModelClient,
  B: BlobStore,
{
  require_identity(&params.identity)?;
  Ok(Json(service.build_context(&params.identity).await))
}

// ─── Export ───────────────────────────────────────────────────────────────────

/// `GET /memory/export`
pub async fn export<S, M, B>(
  State(service): State<Arc<MemoryService<S, M, B>>>,
) -> Result<Json<Snapshot>, ApiError>
where
  S: MemoryStore,
  M: ModelClient,
  B: BlobStore,
{
  Ok(Json(service.export().await?))
}

// ─── Backup ───────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct BackupResponse {
  pub status:  &'static str,
  pub outcome: SyncOutcome,
}

/// `POST /memory/backup`
pub async fn backup<S, M, B>(
  State(service): State<Arc<MemoryService<S, M, B>>>,
) -> Result<Json<BackupResponse>, ApiError>
where
  S: MemoryStore,
  M: ModelClient,
  B: BlobStore,
{
  let outcome = service.sync_to_remote().await?;
  tracing::info!(?outcome, "manual backup");
  Ok(Json(BackupResponse { status: "backup_triggered", outcome }))
}
