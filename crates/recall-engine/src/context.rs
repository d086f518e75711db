//! Prompt context assembly.
//!
//! Produces three independent text blocks for an identity. Nothing is ranked,
//! truncated or deduplicated here beyond the history window; an empty store
//! yields empty strings.

use recall_core::{
  Identity,
  fact::Fact,
  message::render_transcript,
  store::MemoryStore,
  summary::Summary,
};
use serde::{Deserialize, Serialize};

pub const FACTS_HEADER: &str = "THINGS YOU REMEMBER ABOUT THIS PERSON:";
pub const SUMMARIES_HEADER: &str = "SUMMARIES OF PAST CONVERSATIONS:";

/// The rendered memory handed to the response generator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextBundle {
  /// Recent turns as `User:` / `AI:` lines, oldest first.
  pub history:   String,
  /// Category-tagged facts under [`FACTS_HEADER`], or empty.
  pub facts:     String,
  /// Date-tagged summaries under [`SUMMARIES_HEADER`], or empty.
  pub summaries: String,
}

impl ContextBundle {
  /// Join the memory blocks and an externally supplied live-context string,
  /// skipping the empty ones.
  pub fn render_prompt_sections(&self, live_context: &str) -> String {
    [self.facts.as_str(), self.summaries.as_str(), live_context]
      .into_iter()
      .filter(|s| !s.is_empty())
      .collect::<Vec<_>>()
      .join("\n\n")
  }
}

#[derive(Debug, Clone, Copy)]
pub struct ContextAssembler {
  history_window: usize,
}

impl ContextAssembler {
  pub fn new(history_window: usize) -> Self { Self { history_window } }

  pub async fn assemble<S: MemoryStore>(
    &self,
    store: &S,
    identity: &Identity,
  ) -> Result<ContextBundle, S::Error> {
    let history   = store.recent_messages(identity, self.history_window).await?;
    let facts     = store.list_facts(identity).await?;
    let summaries = store.list_summaries(identity).await?;

    Ok(ContextBundle {
      history:   render_transcript(&history),
      facts:     render_facts(&facts),
      summaries: render_summaries(&summaries),
    })
  }
}

pub fn render_facts(facts: &[Fact]) -> String {
  if facts.is_empty() {
    return String::new();
  }
  let lines = facts
    .iter()
    .map(|f| format!("- [{}] {}", f.category, f.fact))
    .collect::<Vec<_>>();
  format!("{FACTS_HEADER}\n{}", lines.join("\n"))
}

pub fn render_summaries(summaries: &[Summary]) -> String {
  if summaries.is_empty() {
    return String::new();
  }
  let lines = summaries
    .iter()
    .map(|s| format!("[{}] {}", s.timestamp.format("%Y-%m-%d"), s.summary))
    .collect::<Vec<_>>();
  format!("{SUMMARIES_HEADER}\n{}", lines.join("\n"))
}
