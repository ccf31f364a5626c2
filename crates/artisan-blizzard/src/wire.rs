//! Upstream JSON shapes and their conversion into core payload types.
//!
//! Only the fields the mirror uses are declared; everything else in the
//! upstream documents is ignored. Optional arrays default to empty so a
//! character with no professions or a tier with no categories decodes
//! cleanly.

use serde::Deserialize;

use artisan_core::roster::{
  CharacterProfessions, CharacterSummary, LocalizedName, ProfessionKnowledge, ProfessionRef,
  RecipeCategory, RecipeDetails, RecipeRef, RosterMember, SkillTierRef, TierKnowledge,
};

fn resolve(name: &LocalizedName, locale: &str) -> String {
  name.resolve(locale).unwrap_or_default().to_owned()
}

// ─── OAuth ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
  pub access_token: String,
  /// Lifetime in seconds.
  #[serde(default)]
  pub expires_in:   Option<i64>,
}

// ─── Shared references ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct NamedRef {
  pub name: LocalizedName,
}

#[derive(Debug, Deserialize)]
pub struct IdRef {
  pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct KeyedRef {
  pub id:   i64,
  pub name: LocalizedName,
}

impl KeyedRef {
  fn into_recipe_ref(self, locale: &str) -> RecipeRef {
    RecipeRef { id: self.id, name: resolve(&self.name, locale) }
  }
}

// ─── Roster ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RosterResponse {
  #[serde(default)]
  pub members: Vec<RosterEntry>,
}

#[derive(Debug, Deserialize)]
pub struct RosterEntry {
  pub character: RosterCharacter,
}

#[derive(Debug, Deserialize)]
pub struct RosterCharacter {
  pub name:  String,
  pub realm: RealmRef,
}

#[derive(Debug, Deserialize)]
pub struct RealmRef {
  pub slug: String,
}

impl RosterResponse {
  pub fn into_members(self) -> Vec<RosterMember> {
    self
      .members
      .into_iter()
      .map(|e| RosterMember::new(e.character.name, e.character.realm.slug))
      .collect()
  }
}

// ─── Character profile ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SummaryResponse {
  #[serde(default)]
  pub character_class: Option<NamedRef>,
  #[serde(default)]
  pub active_spec:     Option<NamedRef>,
}

impl SummaryResponse {
  pub fn into_summary(self, locale: &str) -> CharacterSummary {
    let pick = |r: Option<NamedRef>| {
      r.and_then(|r| r.name.resolve(locale).map(str::to_owned))
        .filter(|s| !s.is_empty())
    };
    CharacterSummary {
      class: pick(self.character_class),
      spec:  pick(self.active_spec),
    }
  }
}

#[derive(Debug, Deserialize)]
pub struct ProfessionsResponse {
  #[serde(default)]
  pub primaries:   Vec<ProfessionEntry>,
  #[serde(default)]
  pub secondaries: Vec<ProfessionEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ProfessionEntry {
  pub profession: KeyedRef,
  #[serde(default)]
  pub tiers:      Vec<TierEntry>,
}

#[derive(Debug, Deserialize)]
pub struct TierEntry {
  pub tier:          KeyedRef,
  #[serde(default)]
  pub known_recipes: Vec<KeyedRef>,
}

impl ProfessionEntry {
  fn into_knowledge(self, locale: &str) -> ProfessionKnowledge {
    ProfessionKnowledge {
      profession_id: Some(self.profession.id),
      name:          resolve(&self.profession.name, locale),
      tiers:         self
        .tiers
        .into_iter()
        .map(|t| TierKnowledge {
          tier_id:       Some(t.tier.id),
          tier_name:     Some(resolve(&t.tier.name, locale)),
          known_recipes: t
            .known_recipes
            .into_iter()
            .map(|r| r.into_recipe_ref(locale))
            .collect(),
        })
        .collect(),
    }
  }
}

impl ProfessionsResponse {
  pub fn into_professions(self, locale: &str) -> CharacterProfessions {
    CharacterProfessions {
      primaries:   self.primaries.into_iter().map(|p| p.into_knowledge(locale)).collect(),
      secondaries: self.secondaries.into_iter().map(|p| p.into_knowledge(locale)).collect(),
    }
  }
}

// ─── Static catalog ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ProfessionIndexResponse {
  #[serde(default)]
  pub professions: Vec<KeyedRef>,
}

impl ProfessionIndexResponse {
  pub fn into_refs(self) -> Vec<ProfessionRef> {
    self
      .professions
      .into_iter()
      .map(|p| ProfessionRef { id: p.id, name: p.name })
      .collect()
  }
}

#[derive(Debug, Deserialize)]
pub struct ProfessionDetailResponse {
  #[serde(default)]
  pub skill_tiers: Vec<KeyedRef>,
}

impl ProfessionDetailResponse {
  pub fn into_tiers(self, locale: &str) -> Vec<SkillTierRef> {
    self
      .skill_tiers
      .into_iter()
      .map(|t| SkillTierRef { id: t.id, name: resolve(&t.name, locale) })
      .collect()
  }
}

#[derive(Debug, Deserialize)]
pub struct SkillTierResponse {
  #[serde(default)]
  pub categories: Vec<CategoryEntry>,
}

#[derive(Debug, Deserialize)]
pub struct CategoryEntry {
  #[serde(default)]
  pub name:    Option<LocalizedName>,
  #[serde(default)]
  pub recipes: Vec<KeyedRef>,
}

impl SkillTierResponse {
  pub fn into_categories(self, locale: &str) -> Vec<RecipeCategory> {
    self
      .categories
      .into_iter()
      .map(|c| RecipeCategory {
        name:    c.name.as_ref().map(|n| resolve(n, locale)),
        recipes: c.recipes.into_iter().map(|r| r.into_recipe_ref(locale)).collect(),
      })
      .collect()
  }
}

#[derive(Debug, Deserialize)]
pub struct RecipeResponse {
  #[serde(default)]
  pub name:         Option<LocalizedName>,
  #[serde(default)]
  pub crafted_item: Option<IdRef>,
}

impl RecipeResponse {
  pub fn into_details(self, locale: &str) -> RecipeDetails {
    RecipeDetails {
      name:            self.name.as_ref().map(|n| resolve(n, locale)),
      crafted_item_id: self.crafted_item.map(|i| i.id),
    }
  }
}
