//! [`GuildDirectory`] for [`SqliteStore`]: crafter searches, member listings
//! and the claim transactions.

use rusqlite::OptionalExtension as _;

use artisan_core::{
  catalog::{Crafter, Recipe, RecipeId},
  member::Member,
  role::MainRole,
  store::GuildDirectory,
};

use crate::{
  encode::{
    CRAFTER_COLUMNS, MEMBER_COLUMNS, RECIPE_COLUMNS, RawCrafter, RawMember, RawRecipe,
    like_pattern,
  },
  Error, Result, SqliteStore,
};

/// Outcome of a claim-family transaction, mapped to a domain error outside
/// the connection thread.
enum ClaimStep {
  Done(RawMember),
  Missing,
  ClaimedByOther,
  NotOwned,
}

impl ClaimStep {
  fn finish(self, name: &str) -> Result<Member> {
    let err = match self {
      Self::Done(raw) => return Ok(raw.into_member()),
      Self::Missing => artisan_core::Error::MemberNotFound(name.to_owned()),
      Self::ClaimedByOther => artisan_core::Error::AlreadyClaimed(name.to_owned()),
      Self::NotOwned => artisan_core::Error::NotOwner(name.to_owned()),
    };
    Err(Error::Core(err))
  }
}

fn member_by_name(conn: &rusqlite::Connection, name: &str) -> rusqlite::Result<Option<RawMember>> {
  conn
    .query_row(
      &format!(
        "SELECT {MEMBER_COLUMNS} FROM members m
         WHERE m.name = ?1 COLLATE NOCASE
         ORDER BY m.member_id
         LIMIT 1"
      ),
      rusqlite::params![name],
      RawMember::from_row,
    )
    .optional()
}

fn member_by_id(conn: &rusqlite::Connection, id: i64) -> rusqlite::Result<RawMember> {
  conn.query_row(
    &format!("SELECT {MEMBER_COLUMNS} FROM members m WHERE m.member_id = ?1"),
    rusqlite::params![id],
    RawMember::from_row,
  )
}

/// Clear `owner`'s main flag everywhere, then set it on `member_id`.
fn promote_main(conn: &rusqlite::Connection, owner: &str, member_id: i64) -> rusqlite::Result<()> {
  conn.execute(
    "UPDATE members SET is_main = 0 WHERE owner = ?1 AND is_main = 1",
    rusqlite::params![owner],
  )?;
  conn.execute(
    "UPDATE members SET is_main = 1 WHERE member_id = ?1",
    rusqlite::params![member_id],
  )?;
  Ok(())
}

impl SqliteStore {
  async fn query_members(
    &self,
    filter: &'static str,
    param: Option<String>,
  ) -> Result<Vec<Member>> {
    let raws: Vec<RawMember> = self
      .conn
      .call(move |conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {MEMBER_COLUMNS} FROM members m {filter} ORDER BY m.name"))?;
        let rows = match param {
          Some(p) => stmt.query_map(rusqlite::params![p], RawMember::from_row)?,
          None => stmt.query_map([], RawMember::from_row)?,
        }
        .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(raws.into_iter().map(RawMember::into_member).collect())
  }

  async fn query_crafters(&self, filter: &'static str, param: rusqlite::types::Value) -> Result<Vec<Crafter>> {
    let raws: Vec<RawCrafter> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {CRAFTER_COLUMNS}
           FROM member_recipes mr
           JOIN members     m ON m.member_id     = mr.member_id
           JOIN recipes     r ON r.recipe_id     = mr.recipe_id
           JOIN professions p ON p.profession_id = mr.profession_id
           WHERE {filter}
           ORDER BY r.name, m.name"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![param], RawCrafter::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(raws.into_iter().map(RawCrafter::into_crafter).collect())
  }
}

// ─── GuildDirectory impl ─────────────────────────────────────────────────────

impl GuildDirectory for SqliteStore {
  type Error = Error;

  // ── Knowledge search ──────────────────────────────────────────────────────

  async fn search_by_recipe_name(&self, fragment: &str) -> Result<Vec<Crafter>> {
    let pattern = like_pattern(fragment.trim());
    self.query_crafters("r.name LIKE ?1 ESCAPE '\\'", pattern.into()).await
  }

  async fn search_by_item_id(&self, item_id: i64) -> Result<Vec<Crafter>> {
    self.query_crafters("r.item_id = ?1", item_id.into()).await
  }

  // ── Member listings ───────────────────────────────────────────────────────

  async fn get_member_by_name(&self, name: &str) -> Result<Option<Member>> {
    let name = name.trim().to_owned();
    let raw = self.conn.call(move |conn| Ok(member_by_name(conn, &name)?)).await?;
    Ok(raw.map(RawMember::into_member))
  }

  async fn members_by_profession(&self, profession: &str) -> Result<Vec<Member>> {
    self
      .query_members(
        "WHERE m.member_id IN (
           SELECT mr.member_id FROM member_recipes mr
           JOIN professions p ON p.profession_id = mr.profession_id
           WHERE p.name = ?1 COLLATE NOCASE
         )",
        Some(profession.trim().to_owned()),
      )
      .await
  }

  async fn members_by_role(&self, role: MainRole) -> Result<Vec<Member>> {
    // The stored column can be stale or NULL; filter on the re-derived role.
    let all = self.query_members("", None).await?;
    Ok(all.into_iter().filter(|m| m.main_role() == Some(role)).collect())
  }

  async fn members_by_class(&self, class: &str) -> Result<Vec<Member>> {
    self
      .query_members("WHERE m.class = ?1 COLLATE NOCASE", Some(class.trim().to_owned()))
      .await
  }

  async fn claimed_members(&self, mains_only: bool) -> Result<Vec<Member>> {
    let filter = if mains_only {
      "WHERE m.owner IS NOT NULL AND m.is_main = 1"
    } else {
      "WHERE m.owner IS NOT NULL"
    };
    self.query_members(filter, None).await
  }

  async fn unclaimed_members(&self) -> Result<Vec<Member>> {
    self.query_members("WHERE m.owner IS NULL", None).await
  }

  async fn unclaimed_names_matching(&self, fragment: &str, limit: usize) -> Result<Vec<String>> {
    let pattern = like_pattern(fragment.trim());
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);

    let names = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT name FROM members
           WHERE owner IS NULL AND name LIKE ?1 ESCAPE '\\'
           ORDER BY name
           LIMIT ?2",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![pattern, limit], |r| r.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(names)
  }

  async fn professions_for_member(&self, name: &str) -> Result<Vec<String>> {
    let name = name.trim().to_owned();

    let names = self
      .conn
      .call(move |conn| {
        let Some(member) = member_by_name(conn, &name)? else {
          return Ok(Vec::new());
        };
        let mut stmt = conn.prepare(
          "SELECT DISTINCT p.name FROM member_recipes mr
           JOIN professions p ON p.profession_id = mr.profession_id
           WHERE mr.member_id = ?1
           ORDER BY p.name",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![member.id], |r| r.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(names)
  }

  // ── Catalog browsing ──────────────────────────────────────────────────────

  async fn get_recipe(&self, id: RecipeId) -> Result<Option<Recipe>> {
    let raw = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {RECIPE_COLUMNS} FROM recipes r
               JOIN professions p ON p.profession_id = r.profession_id
               WHERE r.recipe_id = ?1"
            ),
            rusqlite::params![id],
            RawRecipe::from_row,
          )
          .optional()?)
      })
      .await?;
    Ok(raw.map(RawRecipe::into_recipe))
  }

  async fn list_recipes(&self, limit: usize, offset: usize) -> Result<Vec<Recipe>> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let offset = i64::try_from(offset).unwrap_or(i64::MAX);

    let raws: Vec<RawRecipe> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {RECIPE_COLUMNS} FROM recipes r
           JOIN professions p ON p.profession_id = r.profession_id
           ORDER BY r.recipe_id
           LIMIT ?1 OFFSET ?2"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![limit, offset], RawRecipe::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(raws.into_iter().map(RawRecipe::into_recipe).collect())
  }

  // ── Claims ────────────────────────────────────────────────────────────────

  async fn claim_member(&self, name: &str, owner: &str, make_main: bool) -> Result<Member> {
    let (lookup, owner) = (name.trim().to_owned(), owner.to_owned());

    let step = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let Some(member) = member_by_name(&tx, &lookup)? else {
          return Ok(ClaimStep::Missing);
        };
        match member.owner.as_deref() {
          Some(existing) if existing != owner => return Ok(ClaimStep::ClaimedByOther),
          _ => {}
        }

        let others: i64 = tx.query_row(
          "SELECT COUNT(*) FROM members WHERE owner = ?1 AND member_id != ?2",
          rusqlite::params![owner, member.id],
          |r| r.get(0),
        )?;

        tx.execute(
          "UPDATE members SET owner = ?1 WHERE member_id = ?2",
          rusqlite::params![owner, member.id],
        )?;
        if make_main || others == 0 {
          promote_main(&tx, &owner, member.id)?;
        }

        let claimed = member_by_id(&tx, member.id)?;
        tx.commit()?;
        Ok(ClaimStep::Done(claimed))
      })
      .await?;

    step.finish(name)
  }

  async fn set_main(&self, name: &str, owner: &str) -> Result<Member> {
    let (lookup, owner) = (name.trim().to_owned(), owner.to_owned());

    let step = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let Some(member) = member_by_name(&tx, &lookup)? else {
          return Ok(ClaimStep::Missing);
        };
        if member.owner.as_deref() != Some(owner.as_str()) {
          return Ok(ClaimStep::NotOwned);
        }

        promote_main(&tx, &owner, member.id)?;
        let updated = member_by_id(&tx, member.id)?;
        tx.commit()?;
        Ok(ClaimStep::Done(updated))
      })
      .await?;

    step.finish(name)
  }

  async fn unclaim_member(&self, name: &str, owner: &str) -> Result<Member> {
    let (lookup, owner) = (name.trim().to_owned(), owner.to_owned());

    let step = self
      .conn
      .call(move |conn| {
        let Some(member) = member_by_name(conn, &lookup)? else {
          return Ok(ClaimStep::Missing);
        };
        if member.owner.as_deref() != Some(owner.as_str()) {
          return Ok(ClaimStep::NotOwned);
        }

        conn.execute(
          "UPDATE members SET owner = NULL, is_main = 0 WHERE member_id = ?1",
          rusqlite::params![member.id],
        )?;
        Ok(ClaimStep::Done(member_by_id(conn, member.id)?))
      })
      .await?;

    step.finish(name)
  }

  async fn list_owned(&self, owner: &str) -> Result<Vec<Member>> {
    let owner = owner.to_owned();

    let raws: Vec<RawMember> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {MEMBER_COLUMNS} FROM members m
           WHERE m.owner = ?1
           ORDER BY m.name"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![owner], RawMember::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(raws.into_iter().map(RawMember::into_member).collect())
  }
}
