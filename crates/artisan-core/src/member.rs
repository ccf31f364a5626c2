//! A member is one game character mirrored from the guild roster.

use serde::{Deserialize, Serialize};

use crate::role::{MainRole, derive_main_role};

/// Local surrogate key of a [`Member`] row.
pub type MemberId = i64;

/// A guild character as persisted locally.
///
/// `(name, realm)` is the natural key. `owner` is the linked external-chat
/// identity, if the character has been claimed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
  pub id:      MemberId,
  pub name:    String,
  /// Realm slug, e.g. `"stormrage"`.
  pub realm:   String,
  pub owner:   Option<String>,
  pub class:   Option<String>,
  pub spec:    Option<String>,
  /// The role column as last written. Prefer [`Member::main_role`].
  pub role:    Option<MainRole>,
  pub is_main: bool,
}

impl Member {
  /// The effective main role: re-derived from spec and class, falling back
  /// to the stored column only when derivation is impossible.
  pub fn main_role(&self) -> Option<MainRole> {
    match (self.spec.as_deref(), self.class.as_deref()) {
      (Some(spec), Some(class)) => derive_main_role(spec, class).or(self.role),
      _ => self.role,
    }
  }

  pub fn is_claimed(&self) -> bool { self.owner.is_some() }
}

/// Input to [`crate::store::GuildStore::upsert_member`].
///
/// `class` and `spec` of `None` leave the stored values untouched on update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberUpsert {
  pub name:  String,
  pub realm: String,
  pub class: Option<String>,
  pub spec:  Option<String>,
  pub role:  Option<MainRole>,
}

/// What an upsert did to the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertOutcome {
  Inserted,
  Updated,
  /// The row existed and every column already matched.
  Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberUpsertResult {
  pub id:      MemberId,
  pub outcome: UpsertOutcome,
}

/// Result of removing members that left the guild.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Departures {
  pub members:        usize,
  /// Knowledge rows deleted ahead of their members.
  pub knowledge_rows: usize,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn member(spec: Option<&str>, class: Option<&str>, role: Option<MainRole>) -> Member {
    Member {
      id:      1,
      name:    "Thrall".into(),
      realm:   "stormrage".into(),
      owner:   None,
      class:   class.map(str::to_owned),
      spec:    spec.map(str::to_owned),
      role,
      is_main: false,
    }
  }

  #[test]
  fn main_role_prefers_derivation_over_stored_column() {
    let m = member(Some("Restoration"), Some("Shaman"), Some(MainRole::MeleeDps));
    assert_eq!(m.main_role(), Some(MainRole::Healer));
  }

  #[test]
  fn main_role_fills_missing_column() {
    let m = member(Some("Guardian"), Some("Druid"), None);
    assert_eq!(m.main_role(), Some(MainRole::Tank));
  }

  #[test]
  fn main_role_falls_back_when_underivable() {
    let m = member(None, Some("Druid"), Some(MainRole::Tank));
    assert_eq!(m.main_role(), Some(MainRole::Tank));

    let m = member(Some("Chronomancer"), Some("Evoker"), None);
    assert_eq!(m.main_role(), None);
  }
}
