//! The memory pipeline on top of a [`recall_core::store::MemoryStore`].
//!
//! - [`extractor`] turns a user utterance into at most one fact.
//! - [`context`] renders history, facts and summaries into prompt text.
//! - [`summarizer`] asks a model to compress a finished conversation.
//! - [`backup`] snapshots the whole store to a remote blob and restores it.
//! - [`service`] ties these together behind the turn/conversation operations
//!   the call-handling layer uses.
//!
//! External services are reached through the [`model::ModelClient`] and
//! [`blob::BlobStore`] traits; credentials are the implementor's concern.

#![allow(async_fn_in_trait)]

pub mod backup;
pub mod blob;
pub mod config;
pub mod context;
pub mod error;
pub mod extractor;
pub mod model;
pub mod service;
pub mod summarizer;

pub use config::MemoryConfig;
pub use error::{Error, Result};
pub use service::MemoryService;

#[cfg(test)]
pub(crate) mod testing;
