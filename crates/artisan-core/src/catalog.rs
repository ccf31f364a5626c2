//! Catalog types: the static profession and recipe reference lists, and the
//! per-member knowledge that points into them.

use serde::{Deserialize, Serialize};

use crate::member::MemberId;

/// Local surrogate key of a [`Profession`] row.
pub type ProfessionId = i64;

/// Local surrogate key of a [`Recipe`] row.
pub type RecipeId = i64;

/// A craft discipline. Inserted once by the catalog bootstrap; only the
/// bootstrap flag changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profession {
  pub id:                   ProfessionId,
  /// Stable id assigned by the game-data API.
  pub external_id:          i64,
  pub name:                 String,
  /// Set once every skill tier's recipes have been fetched and stored.
  pub recipes_bootstrapped: bool,
}

/// One item-producing recipe, scoped to a profession and skill tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
  pub id:              RecipeId,
  pub profession_id:   ProfessionId,
  pub profession_name: String,
  pub skill_tier_id:   Option<i64>,
  pub skill_tier_name: Option<String>,
  /// Unique within the profession.
  pub external_id:     i64,
  pub name:            String,
  /// The produced item; resolved lazily and may stay unknown.
  pub item_id:         Option<i64>,
}

/// Input to [`crate::store::GuildStore::insert_recipe_if_absent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecipe {
  pub profession_id:   ProfessionId,
  pub skill_tier_id:   Option<i64>,
  pub skill_tier_name: Option<String>,
  pub external_id:     i64,
  pub name:            String,
}

/// Row counts changed by one knowledge reconciliation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeDelta {
  pub added:   usize,
  pub removed: usize,
}

impl std::ops::AddAssign for KnowledgeDelta {
  fn add_assign(&mut self, rhs: Self) {
    self.added += rhs.added;
    self.removed += rhs.removed;
  }
}

/// One "who can craft X" answer: a member who knows a matching recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crafter {
  pub member_id:   MemberId,
  pub member_name: String,
  pub realm:       String,
  pub owner:       Option<String>,
  pub profession:  String,
  pub recipe_id:   RecipeId,
  pub recipe_name: String,
  pub item_id:     Option<i64>,
}
