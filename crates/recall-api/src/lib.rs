//! JSON REST API for Recall.
//!
//! Exposes an axum [`Router`] over a shared [`MemoryService`]. Auth, TLS, and
//! transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = recall_api::api_router(service.clone());
//! ```

pub mod error;
pub mod memory;
pub mod turns;

use std::sync::Arc;

use axum::{
  Json, Router,
  routing::{get, post},
};
use recall_core::{Identity, store::MemoryStore};
use recall_engine::{MemoryService, blob::BlobStore, model::ModelClient};
use serde_json::{Value, json};

pub use error::ApiError;

/// Build a fully-materialised API router for `service`.
pub fn api_router<S, M, B>(service: Arc<MemoryService<S, M, B>>) -> Router<()>
where
  S: MemoryStore + 'static,
  M: ModelClient + 'static,
  B: BlobStore + 'static,
{
  Router::new()
    .route("/health", get(health))
    // Memory inspection and backup
    .route("/memory/identities", get(memory::identities::<S, M, B>))
    .route("/memory/stats", get(memory::stats::<S, M, B>))
    .route("/memory/context", get(memory::context::<S, M, B>))
    .route("/memory/export", get(memory::export::<S, M, B>))
    .route("/memory/backup", post(memory::backup::<S, M, B>))
    // Conversation lifecycle
    .route("/turns/user", post(turns::user::<S, M, B>))
    .route("/turns/assistant", post(turns::assistant::<S, M, B>))
    .route("/conversations/end", post(turns::end::<S, M, B>))
    .with_state(service)
}

/// `GET /health`
async fn health() -> Json<Value> { Json(json!({ "status": "healthy" })) }

/// Reject blank identities before they reach the store.
pub(crate) fn require_identity(identity: &Identity) -> Result<(), ApiError> {
  if identity.as_str().trim().is_empty() {
    return Err(ApiError::BadRequest("identity must not be empty".into()));
  }
  Ok(())
}

// ─── Integration tests ────────────────────────────────────────────────────────
