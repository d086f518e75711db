//! Handlers for the conversation lifecycle.
//!
//! Turn endpoints always answer `200`; a storage failure shows up as
//! `{"status":"degraded"}` so the caller can keep talking.

use std::sync::Arc;

use axum::{Json, extract::State};
use recall_core::{Identity, store::MemoryStore};
use recall_engine::{
  MemoryService,
  blob::BlobStore,
  model::ModelClient,
  service::{ConversationEnd, TurnOutcome},
};
use serde::Deserialize;

use crate::{error::ApiError, require_identity};

/// JSON body accepted by `POST /turns/user` and `POST /turns/assistant`.
#[derive(Debug, Deserialize)]
pub struct TurnBody {
  pub identity: Identity,
  pub text:     String,
}

#[derive(Debug, Deserialize)]
pub struct EndBody {
  pub identity: Identity,
}

/// `POST /turns/user`
pub async fn user<S, M, B>(
  State(service): State<Arc<MemoryService<S, M, B>>>,
  Json(body): Json<TurnBody>,
) -> Result<Json<TurnOutcome>, ApiError>
where
  S: MemoryStore,
  M: ModelClient,
  B: BlobStore,
{
  require_identity(&body.identity)?;
  Ok(Json(service.record_user_turn(&body.identity, &body.text).await))
}

/// `POST /turns/assistant`
pub async fn assistant<S, M, B>(
  State(service): State<Arc<MemoryService<S, M, B>>>,
  Json(body): Json<TurnBody>,
) -> Result<Json<TurnOutcome>, ApiError>
where
  S: MemoryStore,
  M: ModelClient,
  B: BlobStore,
{
  require_identity(&body.identity)?;
  Ok(Json(service.record_assistant_turn(&body.identity, &body.text).await))
}

/// `POST /conversations/end`: summarizes, then backs up.
pub async fn end<S, M, B>(
  State(service): State<Arc<MemoryService<S, M, B>>>,
  Json(body): Json<EndBody>,
) -> Result<Json<ConversationEnd>, ApiError>
where
  S: MemoryStore,
  M: ModelClient,
  B: BlobStore,
{
  require_identity(&body.identity)?;
  Ok(Json(service.end_conversation(&body.identity).await))
}
