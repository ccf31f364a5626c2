//! The External Roster Source contract and the payload shapes it yields.
//!
//! Implementations validate upstream JSON at their own boundary and hand back
//! these typed values; nothing past this trait reads ad-hoc properties.

use std::{collections::BTreeMap, fmt, future::Future};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─── Access token ────────────────────────────────────────────────────────────

/// A bearer token for the game-data API.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
  secret:         String,
  pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
  pub fn new(secret: impl Into<String>, expires_at: Option<DateTime<Utc>>) -> Self {
    Self { secret: secret.into(), expires_at }
  }

  pub fn secret(&self) -> &str { &self.secret }

  /// `true` once `now` has reached the expiry deadline.
  pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
    self.expires_at.is_some_and(|deadline| now >= deadline)
  }
}

impl fmt::Debug for AccessToken {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("AccessToken")
      .field("secret", &"<redacted>")
      .field("expires_at", &self.expires_at)
      .finish()
  }
}

// ─── Localised names ─────────────────────────────────────────────────────────

/// A display name that upstream returns either as a plain string or, when no
/// locale was requested, as a locale-keyed map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocalizedName {
  Plain(String),
  Localized(BTreeMap<String, String>),
}

impl LocalizedName {
  /// Pick `locale`, falling back to the first entry in locale-key order.
  pub fn resolve(&self, locale: &str) -> Option<&str> {
    match self {
      Self::Plain(name) => Some(name.as_str()),
      Self::Localized(names) => names
        .get(locale)
        .or_else(|| names.values().next())
        .map(String::as_str),
    }
  }
}

impl From<&str> for LocalizedName {
  fn from(name: &str) -> Self { Self::Plain(name.to_owned()) }
}

// ─── Roster and character payloads ───────────────────────────────────────────

/// One entry of the guild roster: the character's natural key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RosterMember {
  pub name:  String,
  /// Realm slug.
  pub realm: String,
}

impl RosterMember {
  pub fn new(name: impl Into<String>, realm: impl Into<String>) -> Self {
    Self { name: name.into(), realm: realm.into() }
  }
}

impl fmt::Display for RosterMember {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}-{}", self.name, self.realm)
  }
}

/// Class and active specialization of a character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterSummary {
  pub class: Option<String>,
  pub spec:  Option<String>,
}

/// A reference to a recipe as listed by upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeRef {
  pub id:   i64,
  pub name: String,
}

/// A character's known recipes within one skill tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierKnowledge {
  pub tier_id:       Option<i64>,
  pub tier_name:     Option<String>,
  pub known_recipes: Vec<RecipeRef>,
}

/// A profession a character has learned, with per-tier knowledge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfessionKnowledge {
  pub profession_id: Option<i64>,
  pub name:          String,
  pub tiers:         Vec<TierKnowledge>,
}

impl ProfessionKnowledge {
  /// Every recipe reference across all tiers, paired with the tier it was
  /// reported under.
  pub fn known_recipes(&self) -> impl Iterator<Item = (&TierKnowledge, &RecipeRef)> {
    self
      .tiers
      .iter()
      .flat_map(|tier| tier.known_recipes.iter().map(move |r| (tier, r)))
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterProfessions {
  pub primaries:   Vec<ProfessionKnowledge>,
  pub secondaries: Vec<ProfessionKnowledge>,
}

impl CharacterProfessions {
  pub fn all(&self) -> impl Iterator<Item = &ProfessionKnowledge> {
    self.primaries.iter().chain(self.secondaries.iter())
  }
}

// ─── Static catalog payloads ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfessionRef {
  pub id:   i64,
  pub name: LocalizedName,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillTierRef {
  pub id:   i64,
  pub name: String,
}

/// A recipe category within a skill tier. Upstream may repeat a recipe across
/// categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeCategory {
  pub name:    Option<String>,
  pub recipes: Vec<RecipeRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeDetails {
  pub name:            Option<String>,
  pub crafted_item_id: Option<i64>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// The game-data API as the sync engine needs it.
///
/// Character lookups return `Ok(None)` for "not found" (deleted, renamed, or
/// privacy-locked upstream); `Err` is reserved for transport and protocol
/// failures. Timeouts and retries are the implementation's concern.
pub trait RosterSource: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Obtain a bearer token. Implementations may cache until expiry.
  fn fetch_access_token(
    &self,
  ) -> impl Future<Output = Result<AccessToken, Self::Error>> + Send + '_;

  /// The full guild member list, across all upstream pages.
  fn fetch_roster_members<'a>(
    &'a self,
    token: &'a AccessToken,
  ) -> impl Future<Output = Result<Vec<RosterMember>, Self::Error>> + Send + 'a;

  fn fetch_character_summary<'a>(
    &'a self,
    realm: &'a str,
    name: &'a str,
    token: &'a AccessToken,
  ) -> impl Future<Output = Result<Option<CharacterSummary>, Self::Error>> + Send + 'a;

  fn fetch_character_professions<'a>(
    &'a self,
    realm: &'a str,
    name: &'a str,
    token: &'a AccessToken,
  ) -> impl Future<Output = Result<Option<CharacterProfessions>, Self::Error>> + Send + 'a;

  fn fetch_profession_index<'a>(
    &'a self,
    token: &'a AccessToken,
  ) -> impl Future<Output = Result<Vec<ProfessionRef>, Self::Error>> + Send + 'a;

  fn fetch_profession_skill_tiers<'a>(
    &'a self,
    profession_id: i64,
    token: &'a AccessToken,
  ) -> impl Future<Output = Result<Vec<SkillTierRef>, Self::Error>> + Send + 'a;

  fn fetch_recipes_for_tier<'a>(
    &'a self,
    profession_id: i64,
    tier_id: i64,
    token: &'a AccessToken,
  ) -> impl Future<Output = Result<Vec<RecipeCategory>, Self::Error>> + Send + 'a;

  /// Best-effort: any failure yields `None` and must not abort the caller.
  fn fetch_recipe_details<'a>(
    &'a self,
    recipe_id: i64,
    token: &'a AccessToken,
  ) -> impl Future<Output = Option<RecipeDetails>> + Send + 'a;
}
