//! Generative-model invocation.
//!
//! Only the request/response contract matters to the pipeline: a prompt goes
//! in, raw text comes out. Authentication is owned by the implementor.

pub mod gemini;

use std::future::Future;

pub use gemini::{GeminiClient, GeminiConfig};

/// A client that can run a single text-generation request.
pub trait ModelClient: Send + Sync {
  /// Send `prompt` and return the model's raw text answer.
  fn generate<'a>(
    &'a self,
    prompt: &'a str,
  ) -> impl Future<Output = crate::Result<String>> + Send + 'a;
}
