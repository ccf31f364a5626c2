//! [`SqliteStore`]: the SQLite implementation of [`GuildStore`].

use std::{collections::HashSet, path::Path};

use rusqlite::OptionalExtension as _;
use tracing::debug;

use artisan_core::{
  catalog::{KnowledgeDelta, NewRecipe, Profession, ProfessionId, Recipe, RecipeId},
  member::{Departures, MemberId, MemberUpsert, MemberUpsertResult, UpsertOutcome},
  roster::RosterMember,
  store::GuildStore,
};

use crate::{
  encode::{RECIPE_COLUMNS, RawRecipe, decode_count, encode_role},
  schema::{MIGRATE_V1_TO_V2, SCHEMA},
  Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A guild roster mirror backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        let version: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
        conn.execute_batch(SCHEMA)?;
        if version == 1 {
          conn.execute_batch(MIGRATE_V1_TO_V2)?;
        }
        Ok(())
      })
      .await?;
    Ok(())
  }
}

/// Existing column values of a member row, for change detection.
struct ExistingMember {
  id:    i64,
  class: Option<String>,
  spec:  Option<String>,
  role:  Option<String>,
}

// ─── GuildStore impl ─────────────────────────────────────────────────────────

impl GuildStore for SqliteStore {
  type Error = crate::Error;

  // ── Profession catalog ────────────────────────────────────────────────────

  async fn count_professions(&self) -> Result<usize> {
    let n: i64 = self
      .conn
      .call(|conn| {
        Ok(conn.query_row("SELECT COUNT(*) FROM professions", [], |r| r.get(0))?)
      })
      .await?;
    decode_count(n)
  }

  async fn insert_profession_if_absent(&self, external_id: i64, name: String) -> Result<bool> {
    let written = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "INSERT OR IGNORE INTO professions (external_id, name) VALUES (?1, ?2)",
          rusqlite::params![external_id, name],
        )?;
        Ok(n > 0)
      })
      .await?;
    Ok(written)
  }

  async fn list_professions(&self) -> Result<Vec<Profession>> {
    let rows = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT profession_id, external_id, name, recipes_bootstrapped
           FROM professions ORDER BY name",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(Profession {
              id:                   row.get(0)?,
              external_id:          row.get(1)?,
              name:                 row.get(2)?,
              recipes_bootstrapped: row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  async fn find_profession_by_name(&self, name: &str) -> Result<Option<Profession>> {
    let name = name.trim().to_owned();

    let found = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT profession_id, external_id, name, recipes_bootstrapped FROM professions
             WHERE name = ?1 COLLATE NOCASE
             ORDER BY profession_id
             LIMIT 1",
            rusqlite::params![name],
            |row| {
              Ok(Profession {
                id:                   row.get(0)?,
                external_id:          row.get(1)?,
                name:                 row.get(2)?,
                recipes_bootstrapped: row.get(3)?,
              })
            },
          )
          .optional()?)
      })
      .await?;
    Ok(found)
  }

  // ── Recipe catalog ────────────────────────────────────────────────────────

  async fn count_recipes(&self, profession_id: Option<ProfessionId>) -> Result<usize> {
    let n: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM recipes WHERE ?1 IS NULL OR profession_id = ?1",
          rusqlite::params![profession_id],
          |r| r.get(0),
        )?)
      })
      .await?;
    decode_count(n)
  }

  async fn mark_recipes_bootstrapped(&self, profession_id: ProfessionId) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE professions SET recipes_bootstrapped = 1 WHERE profession_id = ?1",
          rusqlite::params![profession_id],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn insert_recipe_if_absent(&self, recipe: NewRecipe) -> Result<bool> {
    let written = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "INSERT OR IGNORE INTO recipes (
             profession_id, skill_tier_id, skill_tier_name, external_id, name
           ) VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![
            recipe.profession_id,
            recipe.skill_tier_id,
            recipe.skill_tier_name,
            recipe.external_id,
            recipe.name,
          ],
        )?;
        Ok(n > 0)
      })
      .await?;
    Ok(written)
  }

  async fn resolve_recipes(
    &self,
    profession_id: ProfessionId,
    external_ids: &[i64],
  ) -> Result<Vec<Recipe>> {
    let external_ids = external_ids.to_vec();

    let raws: Vec<RawRecipe> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {RECIPE_COLUMNS}
           FROM recipes r
           JOIN professions p ON p.profession_id = r.profession_id
           WHERE r.profession_id = ?1 AND r.external_id = ?2"
        ))?;

        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for external_id in external_ids {
          if !seen.insert(external_id) {
            continue;
          }
          if let Some(raw) = stmt
            .query_row(rusqlite::params![profession_id, external_id], RawRecipe::from_row)
            .optional()?
          {
            out.push(raw);
          }
        }
        Ok(out)
      })
      .await?;

    Ok(raws.into_iter().map(RawRecipe::into_recipe).collect())
  }

  async fn set_recipe_item_id(&self, recipe_id: RecipeId, item_id: i64) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE recipes SET item_id = ?1 WHERE recipe_id = ?2",
          rusqlite::params![item_id, recipe_id],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Members and knowledge ─────────────────────────────────────────────────

  async fn upsert_member(&self, input: MemberUpsert) -> Result<MemberUpsertResult> {
    // The role is only rewritten when both inputs it derives from are known.
    let role_known = input.class.is_some() && input.spec.is_some();
    let role = encode_role(input.role);

    let result = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let existing = tx
          .query_row(
            "SELECT member_id, class, spec, role FROM members
             WHERE name = ?1 AND realm = ?2",
            rusqlite::params![input.name, input.realm],
            |row| {
              Ok(ExistingMember {
                id:    row.get(0)?,
                class: row.get(1)?,
                spec:  row.get(2)?,
                role:  row.get(3)?,
              })
            },
          )
          .optional()?;

        let result = match existing {
          None => {
            tx.execute(
              "INSERT INTO members (name, realm, class, spec, role)
               VALUES (?1, ?2, ?3, ?4, ?5)",
              rusqlite::params![input.name, input.realm, input.class, input.spec, role],
            )?;
            MemberUpsertResult {
              id:      tx.last_insert_rowid(),
              outcome: UpsertOutcome::Inserted,
            }
          }
          Some(row) => {
            let class = input.class.or(row.class.clone());
            let spec = input.spec.or(row.spec.clone());
            let role = if role_known { role.map(str::to_owned) } else { row.role.clone() };

            if class == row.class && spec == row.spec && role == row.role {
              MemberUpsertResult { id: row.id, outcome: UpsertOutcome::Unchanged }
            } else {
              tx.execute(
                "UPDATE members SET class = ?1, spec = ?2, role = ?3 WHERE member_id = ?4",
                rusqlite::params![class, spec, role, row.id],
              )?;
              MemberUpsertResult { id: row.id, outcome: UpsertOutcome::Updated }
            }
          }
        };

        tx.commit()?;
        Ok(result)
      })
      .await?;

    Ok(result)
  }

  async fn reconcile_knowledge(
    &self,
    member_id: MemberId,
    profession_id: ProfessionId,
    recipe_ids: &[RecipeId],
  ) -> Result<KnowledgeDelta> {
    let desired: HashSet<RecipeId> = recipe_ids.iter().copied().collect();

    let delta = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut delta = KnowledgeDelta::default();

        {
          let existing: HashSet<RecipeId> = {
            let mut stmt = tx.prepare(
              "SELECT recipe_id FROM member_recipes
               WHERE member_id = ?1 AND profession_id = ?2",
            )?;
            stmt
              .query_map(rusqlite::params![member_id, profession_id], |r| r.get(0))?
              .collect::<rusqlite::Result<HashSet<_>>>()?
          };

          let mut delete = tx.prepare(
            "DELETE FROM member_recipes
             WHERE member_id = ?1 AND profession_id = ?2 AND recipe_id = ?3",
          )?;
          for stale in existing.difference(&desired) {
            delta.removed += delete.execute(rusqlite::params![member_id, profession_id, stale])?;
          }

          let mut insert = tx.prepare(
            "INSERT OR IGNORE INTO member_recipes (member_id, profession_id, recipe_id)
             VALUES (?1, ?2, ?3)",
          )?;
          for fresh in desired.difference(&existing) {
            delta.added += insert.execute(rusqlite::params![member_id, profession_id, fresh])?;
          }
        }

        tx.commit()?;
        Ok(delta)
      })
      .await?;

    debug!(member_id, profession_id, added = delta.added, removed = delta.removed, "knowledge reconciled");
    Ok(delta)
  }

  async fn retain_professions(&self, member_id: MemberId, keep: &[ProfessionId]) -> Result<usize> {
    let keep: HashSet<ProfessionId> = keep.iter().copied().collect();

    let removed = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut removed = 0;

        {
          let dropped: Vec<ProfessionId> = {
            let mut stmt = tx.prepare(
              "SELECT DISTINCT profession_id FROM member_recipes WHERE member_id = ?1",
            )?;
            stmt
              .query_map(rusqlite::params![member_id], |r| r.get(0))?
              .collect::<rusqlite::Result<Vec<_>>>()?
              .into_iter()
              .filter(|id| !keep.contains(id))
              .collect()
          };

          let mut delete = tx.prepare(
            "DELETE FROM member_recipes WHERE member_id = ?1 AND profession_id = ?2",
          )?;
          for profession_id in dropped {
            removed += delete.execute(rusqlite::params![member_id, profession_id])?;
          }
        }

        tx.commit()?;
        Ok(removed)
      })
      .await?;

    if removed > 0 {
      debug!(member_id, removed, "knowledge of dropped professions removed");
    }
    Ok(removed)
  }

  async fn remove_departed_members(&self, current: &[RosterMember]) -> Result<Departures> {
    let current: HashSet<(String, String)> = current
      .iter()
      .map(|m| (m.name.clone(), m.realm.clone()))
      .collect();

    let departures = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut departures = Departures::default();

        {
          let departed: Vec<i64> = {
            let mut stmt = tx.prepare("SELECT member_id, name, realm FROM members")?;
            stmt
              .query_map([], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?))
              })?
              .collect::<rusqlite::Result<Vec<_>>>()?
              .into_iter()
              .filter_map(|(id, name, realm)| (!current.contains(&(name, realm))).then_some(id))
              .collect()
          };

          let mut knowledge = tx.prepare("DELETE FROM member_recipes WHERE member_id = ?1")?;
          let mut member = tx.prepare("DELETE FROM members WHERE member_id = ?1")?;
          for id in departed {
            departures.knowledge_rows += knowledge.execute(rusqlite::params![id])?;
            departures.members += member.execute(rusqlite::params![id])?;
          }
        }

        tx.commit()?;
        Ok(departures)
      })
      .await?;

    Ok(departures)
  }

  async fn sweep_orphaned_knowledge(&self) -> Result<usize> {
    let removed = self
      .conn
      .call(|conn| {
        Ok(conn.execute(
          "DELETE FROM member_recipes
           WHERE member_id     NOT IN (SELECT member_id     FROM members)
              OR recipe_id     NOT IN (SELECT recipe_id     FROM recipes)
              OR profession_id NOT IN (SELECT profession_id FROM professions)",
          [],
        )?)
      })
      .await?;
    Ok(removed)
  }
}
