//! Keyword-based fact extraction from user utterances.
//!
//! Each category owns a fixed list of trigger phrases. An utterance is
//! lowercased and searched for every phrase; the match that starts earliest
//! in the utterance decides the category, and a tie at the same offset goes
//! to the category listed first in [`TRIGGERS`]. The whole utterance is then
//! stored as a single fact. No match means no fact.

use recall_core::{Identity, fact::FactCategory, store::MemoryStore};

/// Trigger phrases, in priority order. Phrases are lowercase.
pub const TRIGGERS: &[(FactCategory, &[&str])] = &[
  (FactCategory::Preference, &[
    "i like",
    "i love",
    "i prefer",
    "i hate",
    "i enjoy",
    "my favorite",
  ]),
  (FactCategory::Personal, &[
    "my name is",
    "i live in",
    "i work at",
    "my job is",
    "i am a",
    "i'm a",
  ]),
  (FactCategory::Goal, &[
    "i want to",
    "i need to",
    "my goal is",
    "i plan to",
    "i'm trying to",
    "i aim to",
  ]),
  (FactCategory::Business, &[
    "my company",
    "my business",
    "my startup",
    "my product",
    "my client",
    "revenue",
    "profit",
    "growth",
  ]),
  (FactCategory::Reminder, &[
    "remind me",
    "don't forget",
    "remember that",
    "keep in mind",
  ]),
];

/// Stateless classifier over [`TRIGGERS`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FactExtractor;

impl FactExtractor {
  /// The category an utterance would be stored under, if any.
  pub fn classify(&self, utterance: &str) -> Option<FactCategory> {
    let lowered = utterance.to_lowercase();
    let mut best: Option<(usize, FactCategory)> = None;

    for (category, phrases) in TRIGGERS {
      let earliest = phrases.iter().filter_map(|p| lowered.find(p)).min();
      if let Some(offset) = earliest
        && best.is_none_or(|(best_offset, _)| offset < best_offset)
      {
        best = Some((offset, *category));
      }
    }

    best.map(|(_, category)| category)
  }

  /// Classify `utterance` and, on a match, record it verbatim (trimmed) as a
  /// fact for `identity`.
  ///
  /// Returns the category used, or `None` when nothing matched. Recording a
  /// fact that already exists is not an error.
  pub async fn extract<S: MemoryStore>(
    &self,
    store: &S,
    identity: &Identity,
    utterance: &str,
  ) -> Result<Option<FactCategory>, S::Error> {
    let Some(category) = self.classify(utterance) else {
      return Ok(None);
    };

    let fact = utterance.trim();
    let inserted = store.record_fact(identity, fact, category).await?;
    tracing::info!(%identity, %category, inserted, "extracted fact from utterance");
    Ok(Some(category))
  }
}
