//! SQLite backend for the Recall memory store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every call additionally goes through a
//! store-owned lock, giving one total order over all storage operations.

mod encode;
mod guard;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
