//! Encoding and decoding helpers between domain types and SQLite columns.
//!
//! Roles are stored as their display strings (`"Ranged DPS"`). Booleans are
//! stored as `0`/`1` integers. Row types hold the raw column values read
//! inside a `tokio_rusqlite` call and are converted once back on the async
//! side.

use artisan_core::{
  catalog::{Crafter, Recipe},
  member::Member,
  role::MainRole,
};

use crate::{Error, Result};

// ─── Column lists ────────────────────────────────────────────────────────────

/// Columns read by [`RawMember::from_row`]; queries alias `members` as `m`.
pub const MEMBER_COLUMNS: &str =
  "m.member_id, m.name, m.realm, m.owner, m.class, m.spec, m.role, m.is_main";

/// Columns read by [`RawRecipe::from_row`]; `recipes r JOIN professions p`.
pub const RECIPE_COLUMNS: &str = "r.recipe_id, r.profession_id, p.name, \
   r.skill_tier_id, r.skill_tier_name, r.external_id, r.name, r.item_id";

/// Columns read by [`RawCrafter::from_row`]; knowledge joined to all three
/// parents.
pub const CRAFTER_COLUMNS: &str = "m.member_id, m.name, m.realm, m.owner, \
   p.name, r.recipe_id, r.name, r.item_id";

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_role(role: Option<MainRole>) -> Option<&'static str> {
  role.map(MainRole::as_str)
}

/// Unrecognised strings decode to `None`; the role is re-derived on read
/// anyway.
pub fn decode_role(s: Option<&str>) -> Option<MainRole> {
  s.and_then(|s| s.parse().ok())
}

pub fn decode_count(n: i64) -> Result<usize> {
  usize::try_from(n).map_err(|_| Error::Count(n))
}

/// A `LIKE` pattern matching `fragment` anywhere, with `%`, `_` and `\`
/// escaped. Use with `ESCAPE '\'`.
pub fn like_pattern(fragment: &str) -> String {
  let mut out = String::with_capacity(fragment.len() + 2);
  out.push('%');
  for c in fragment.chars() {
    if matches!(c, '%' | '_' | '\\') {
      out.push('\\');
    }
    out.push(c);
  }
  out.push('%');
  out
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `members` row.
pub struct RawMember {
  pub id:      i64,
  pub name:    String,
  pub realm:   String,
  pub owner:   Option<String>,
  pub class:   Option<String>,
  pub spec:    Option<String>,
  pub role:    Option<String>,
  pub is_main: bool,
}

impl RawMember {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:      row.get(0)?,
      name:    row.get(1)?,
      realm:   row.get(2)?,
      owner:   row.get(3)?,
      class:   row.get(4)?,
      spec:    row.get(5)?,
      role:    row.get(6)?,
      is_main: row.get(7)?,
    })
  }

  pub fn into_member(self) -> Member {
    Member {
      id:      self.id,
      role:    decode_role(self.role.as_deref()),
      name:    self.name,
      realm:   self.realm,
      owner:   self.owner,
      class:   self.class,
      spec:    self.spec,
      is_main: self.is_main,
    }
  }
}

/// Raw values read from `recipes` joined with its profession.
pub struct RawRecipe {
  pub id:              i64,
  pub profession_id:   i64,
  pub profession_name: String,
  pub skill_tier_id:   Option<i64>,
  pub skill_tier_name: Option<String>,
  pub external_id:     i64,
  pub name:            String,
  pub item_id:         Option<i64>,
}

impl RawRecipe {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:              row.get(0)?,
      profession_id:   row.get(1)?,
      profession_name: row.get(2)?,
      skill_tier_id:   row.get(3)?,
      skill_tier_name: row.get(4)?,
      external_id:     row.get(5)?,
      name:            row.get(6)?,
      item_id:         row.get(7)?,
    })
  }

  pub fn into_recipe(self) -> Recipe {
    Recipe {
      id:              self.id,
      profession_id:   self.profession_id,
      profession_name: self.profession_name,
      skill_tier_id:   self.skill_tier_id,
      skill_tier_name: self.skill_tier_name,
      external_id:     self.external_id,
      name:            self.name,
      item_id:         self.item_id,
    }
  }
}

pub struct RawCrafter {
  pub member_id:   i64,
  pub member_name: String,
  pub realm:       String,
  pub owner:       Option<String>,
  pub profession:  String,
  pub recipe_id:   i64,
  pub recipe_name: String,
  pub item_id:     Option<i64>,
}

impl RawCrafter {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      member_id:   row.get(0)?,
      member_name: row.get(1)?,
      realm:       row.get(2)?,
      owner:       row.get(3)?,
      profession:  row.get(4)?,
      recipe_id:   row.get(5)?,
      recipe_name: row.get(6)?,
      item_id:     row.get(7)?,
    })
  }

  pub fn into_crafter(self) -> Crafter {
    Crafter {
      member_id:   self.member_id,
      member_name: self.member_name,
      realm:       self.realm,
      owner:       self.owner,
      profession:  self.profession,
      recipe_id:   self.recipe_id,
      recipe_name: self.recipe_name,
      item_id:     self.item_id,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn like_pattern_escapes_wildcards() {
    assert_eq!(like_pattern("bolt"), "%bolt%");
    assert_eq!(like_pattern("100%_x\\"), "%100\\%\\_x\\\\%");
  }

  #[test]
  fn role_columns_roundtrip() {
    assert_eq!(encode_role(Some(MainRole::RangedDps)), Some("Ranged DPS"));
    assert_eq!(decode_role(Some("Ranged DPS")), Some(MainRole::RangedDps));
    assert_eq!(decode_role(Some("bogus")), None);
    assert_eq!(decode_role(None), None);
  }
}
