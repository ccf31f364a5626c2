//! Main-role derivation.
//!
//! A character's main role is a pure function of its active specialization
//! and class. Upstream capitalisation is inconsistent, so lookups are
//! case-insensitive. Unknown combinations (a new spec, malformed input) derive
//! to `None` rather than failing.

use std::{collections::HashMap, sync::LazyLock};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// One of the four raid roles a character can fill.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
  IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
pub enum MainRole {
  #[strum(serialize = "Tank")]
  #[serde(rename = "Tank")]
  Tank,
  #[strum(serialize = "Healer")]
  #[serde(rename = "Healer")]
  Healer,
  #[strum(serialize = "Ranged DPS")]
  #[serde(rename = "Ranged DPS")]
  RangedDps,
  #[strum(serialize = "Melee DPS")]
  #[serde(rename = "Melee DPS")]
  MeleeDps,
}

impl MainRole {
  /// The display string stored in the `role` column.
  pub fn as_str(self) -> &'static str { self.into() }
}

/// Every known `(spec, class)` pair, keyed in lowercase.
pub const SPEC_ROLE_TABLE: &[(&str, &str, MainRole)] = &[
  // Death Knight
  ("blood", "death knight", MainRole::Tank),
  ("frost", "death knight", MainRole::MeleeDps),
  ("unholy", "death knight", MainRole::MeleeDps),
  // Demon Hunter
  ("havoc", "demon hunter", MainRole::MeleeDps),
  ("vengeance", "demon hunter", MainRole::Tank),
  // Druid
  ("balance", "druid", MainRole::RangedDps),
  ("feral", "druid", MainRole::MeleeDps),
  ("guardian", "druid", MainRole::Tank),
  ("restoration", "druid", MainRole::Healer),
  // Evoker
  ("augmentation", "evoker", MainRole::RangedDps),
  ("devastation", "evoker", MainRole::RangedDps),
  ("preservation", "evoker", MainRole::Healer),
  // Hunter
  ("beast mastery", "hunter", MainRole::RangedDps),
  ("marksmanship", "hunter", MainRole::RangedDps),
  ("survival", "hunter", MainRole::MeleeDps),
  // Mage
  ("arcane", "mage", MainRole::RangedDps),
  ("fire", "mage", MainRole::RangedDps),
  ("frost", "mage", MainRole::RangedDps),
  // Monk
  ("brewmaster", "monk", MainRole::Tank),
  ("mistweaver", "monk", MainRole::Healer),
  ("windwalker", "monk", MainRole::MeleeDps),
  // Paladin
  ("holy", "paladin", MainRole::Healer),
  ("protection", "paladin", MainRole::Tank),
  ("retribution", "paladin", MainRole::MeleeDps),
  // Priest
  ("discipline", "priest", MainRole::Healer),
  ("holy", "priest", MainRole::Healer),
  ("shadow", "priest", MainRole::RangedDps),
  // Rogue
  ("assassination", "rogue", MainRole::MeleeDps),
  ("outlaw", "rogue", MainRole::MeleeDps),
  ("subtlety", "rogue", MainRole::MeleeDps),
  // Shaman
  ("elemental", "shaman", MainRole::RangedDps),
  ("enhancement", "shaman", MainRole::MeleeDps),
  ("restoration", "shaman", MainRole::Healer),
  // Warlock
  ("affliction", "warlock", MainRole::RangedDps),
  ("demonology", "warlock", MainRole::RangedDps),
  ("destruction", "warlock", MainRole::RangedDps),
  // Warrior
  ("arms", "warrior", MainRole::MeleeDps),
  ("fury", "warrior", MainRole::MeleeDps),
  ("protection", "warrior", MainRole::Tank),
];

static ROLE_INDEX: LazyLock<HashMap<String, MainRole>> = LazyLock::new(|| {
  SPEC_ROLE_TABLE
    .iter()
    .map(|(spec, class, role)| (format!("{spec} {class}"), *role))
    .collect()
});

/// Derive the main role for a `(spec, class)` pair, ignoring case and
/// surrounding whitespace.
pub fn derive_main_role(spec: &str, class: &str) -> Option<MainRole> {
  let key = format!("{} {}", spec.trim(), class.trim()).to_lowercase();
  ROLE_INDEX.get(&key).copied()
}
