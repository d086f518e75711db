//! Long-term facts remembered about an identity.
//!
//! Facts are immutable and never deleted; memory only grows. The pair
//! `(identity, fact)` is unique, and recording a duplicate is a silent no-op.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Identity};

/// The tag attached to every fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactCategory {
  #[default]
  General,
  Preference,
  Personal,
  Goal,
  Business,
  Reminder,
  /// Pulled out of a conversation by the summarizer.
  Extracted,
  /// A follow-up task; stored text carries an `ACTION: ` prefix.
  ActionItem,
}

impl FactCategory {
  /// The discriminant stored in the `category` column.
  /// Must match the `rename_all = "snake_case"` serde tags above.
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::General => "general",
      Self::Preference => "preference",
      Self::Personal => "personal",
      Self::Goal => "goal",
      Self::Business => "business",
      Self::Reminder => "reminder",
      Self::Extracted => "extracted",
      Self::ActionItem => "action_item",
    }
  }
}

impl fmt::Display for FactCategory {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for FactCategory {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "general" => Ok(Self::General),
      "preference" => Ok(Self::Preference),
      "personal" => Ok(Self::Personal),
      "goal" => Ok(Self::Goal),
      "business" => Ok(Self::Business),
      "reminder" => Ok(Self::Reminder),
      "extracted" => Ok(Self::Extracted),
      "action_item" => Ok(Self::ActionItem),
      other => Err(Error::UnknownCategory(other.to_owned())),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
  pub id:        i64,
  pub identity:  Identity,
  pub fact:      String,
  pub category:  FactCategory,
  pub timestamp: DateTime<Utc>,
}
