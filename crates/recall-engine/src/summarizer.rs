//! End-of-conversation summarization.
//!
//! The most recent turns are sent to a [`ModelClient`] with a request for a
//! fixed JSON shape. A successful answer becomes one summary plus one fact per
//! extracted fact or action item. A failed call or an unparsable answer writes
//! nothing; the failure is logged and reported as [`SummaryOutcome::Failed`].
//!
//! Store reads and writes each take the store lock on their own; the model
//! call runs between them without holding it.

use recall_core::{
  Identity,
  fact::FactCategory,
  message::render_transcript,
  store::MemoryStore,
};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, model::ModelClient};

/// Prefix prepended to every stored action item.
pub const ACTION_PREFIX: &str = "ACTION: ";

/// The JSON object the model is asked to return.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ConversationDigest {
  #[serde(default)]
  pub summary:      String,
  #[serde(default)]
  pub facts:        Vec<String>,
  #[serde(default)]
  pub action_items: Vec<String>,
}

/// What a summarization attempt did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SummaryOutcome {
  /// Not enough messages; no model call was made.
  TooShort { message_count: u64 },
  /// No model client is configured.
  NoModel,
  /// The model call, the parse, or a store read failed. Nothing was written.
  Failed,
  /// Counts are of newly inserted rows; duplicates of stored facts are not
  /// counted.
  Recorded {
    summary:      bool,
    facts:        usize,
    action_items: usize,
  },
}

#[derive(Debug, Clone, Copy)]
pub struct Summarizer {
  window:       usize,
  min_messages: u64,
}

impl Summarizer {
  pub fn new(window: usize, min_messages: u64) -> Self { Self { window, min_messages } }

  /// Summarize the latest conversation for `identity`. Never fails; see the
  /// module docs for what is written in each case.
  pub async fn summarize<S, M>(
    &self,
    store: &S,
    model: Option<&M>,
    identity: &Identity,
  ) -> SummaryOutcome
  where
    S: MemoryStore,
    M: ModelClient,
  {
    match self.try_summarize(store, model, identity).await {
      Ok(outcome) => outcome,
      Err(e) => {
        tracing::error!(%identity, error = %e, "summarization failed");
        SummaryOutcome::Failed
      }
    }
  }

  async fn try_summarize<S, M>(
    &self,
    store: &S,
    model: Option<&M>,
    identity: &Identity,
  ) -> Result<SummaryOutcome>
  where
    S: MemoryStore,
    M: ModelClient,
  {
    let message_count = store.count_messages(identity).await.map_err(Error::storage)?;
    if message_count < self.min_messages {
      tracing::debug!(%identity, message_count, "too few messages to summarize");
      return Ok(SummaryOutcome::TooShort { message_count });
    }

    let Some(model) = model else {
      tracing::warn!(%identity, "no model client configured; skipping summarization");
      return Ok(SummaryOutcome::NoModel);
    };

    let recent = store
      .recent_messages(identity, self.window)
      .await
      .map_err(Error::storage)?;
    let prompt = build_prompt(&render_transcript(&recent));

    let raw = model.generate(&prompt).await?;
    let digest = parse_digest(&raw)?;

    Ok(self.record(store, identity, &digest, message_count).await)
  }

  /// Write a parsed digest. Individual write failures are logged and skipped.
  async fn record<S: MemoryStore>(
    &self,
    store: &S,
    identity: &Identity,
    digest: &ConversationDigest,
    message_count: u64,
  ) -> SummaryOutcome {
    let mut summary = false;
    if !digest.summary.is_empty() {
      match store.record_summary(identity, &digest.summary, message_count).await {
        Ok(_) => summary = true,
        Err(e) => tracing::error!(%identity, error = %e, "failed to store summary"),
      }
    }

    let mut facts = 0;
    for fact in &digest.facts {
      match store.record_fact(identity, fact, FactCategory::Extracted).await {
        Ok(inserted) => facts += usize::from(inserted),
        Err(e) => tracing::error!(%identity, error = %e, "failed to store extracted fact"),
      }
    }

    let mut action_items = 0;
    for item in &digest.action_items {
      let text = format!("{ACTION_PREFIX}{item}");
      match store.record_fact(identity, &text, FactCategory::ActionItem).await {
        Ok(inserted) => action_items += usize::from(inserted),
        Err(e) => tracing::error!(%identity, error = %e, "failed to store action item"),
      }
    }

    tracing::info!(%identity, summary, facts, action_items, "post-conversation extraction");
    SummaryOutcome::Recorded { summary, facts, action_items }
  }
}

pub fn build_prompt(conversation: &str) -> String {
  format!(
    r#"Analyze this conversation and return a JSON response:
{{
  "summary": "2-3 sentence summary of what was discussed",
  "facts": ["list of important facts, preferences, or information the user shared"],
  "action_items": ["any tasks or follow-ups mentioned"]
}}

Conversation:
{conversation}

Return ONLY valid JSON, nothing else."#
  )
}

/// Remove a surrounding Markdown code fence, if present.
///
/// The opening fence line (with any language tag) and everything from the
/// last closing fence onward are dropped.
pub fn strip_code_fence(raw: &str) -> &str {
  let text = raw.trim();
  if !text.starts_with("```") {
    return text;
  }
  let body = text.split_once('\n').map_or("", |(_, rest)| rest);
  let body = match body.rfind("```") {
    Some(end) => &body[..end],
    None => body,
  };
  body.trim()
}

pub fn parse_digest(raw: &str) -> Result<ConversationDigest> {
  Ok(serde_json::from_str(strip_code_fence(raw))?)
}
