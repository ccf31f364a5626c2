//! Profession and recipe catalog population.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, info, warn};

use artisan_core::{
  catalog::{NewRecipe, Profession},
  roster::{AccessToken, RosterSource},
  store::GuildStore,
};

use crate::error::{Result, SyncError, boxed};

/// Rows written by one bootstrap pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BootstrapReport {
  pub professions_added: usize,
  pub recipes_added:     usize,
}

/// Fills the profession and recipe catalogs when they are empty or incomplete.
///
/// Every write is insert-if-absent and each profession carries a completion
/// flag, so an interrupted pass resumes where it stopped.
pub struct CatalogBootstrap<'a, R, S> {
  source: &'a R,
  store:  &'a S,
  locale: &'a str,
}

impl<'a, R, S> CatalogBootstrap<'a, R, S>
where
  R: RosterSource,
  S: GuildStore,
{
  pub fn new(source: &'a R, store: &'a S, locale: &'a str) -> Self {
    Self { source, store, locale }
  }

  pub async fn run(&self, token: &AccessToken) -> Result<BootstrapReport> {
    let professions_added = self.populate_professions_if_empty(token).await?;
    let recipes_added = self.populate_recipes_if_empty(token).await?;
    Ok(BootstrapReport { professions_added, recipes_added })
  }

  /// Insert the upstream profession index if no profession is cataloged.
  pub async fn populate_professions_if_empty(&self, token: &AccessToken) -> Result<usize> {
    let existing = self.store.count_professions().await.map_err(|e| SyncError::Store(boxed(e)))?;
    if existing > 0 {
      debug!(existing, "profession catalog already populated");
      return Ok(0);
    }

    let index = self
      .source
      .fetch_profession_index(token)
      .await
      .map_err(|e| SyncError::Catalog(boxed(e)))?;

    let mut added = 0;
    for profession in index {
      let Some(name) = profession.name.resolve(self.locale).filter(|n| !n.is_empty()) else {
        warn!(external_id = profession.id, "profession has no usable name; skipping");
        continue;
      };
      if self
        .store
        .insert_profession_if_absent(profession.id, name.to_owned())
        .await
        .map_err(|e| SyncError::Store(boxed(e)))?
      {
        added += 1;
      }
    }

    info!(added, "profession catalog populated");
    Ok(added)
  }

  /// Fetch every skill tier's recipes for each cataloged profession whose
  /// recipe bootstrap has not completed yet.
  ///
  /// A profession is flagged complete only when its tier list and every
  /// tier's recipes were fetched, so a pass interrupted by a crash or an
  /// upstream failure is retried on the next run.
  pub async fn populate_recipes_if_empty(&self, token: &AccessToken) -> Result<usize> {
    let professions = self.store.list_professions().await.map_err(|e| SyncError::Store(boxed(e)))?;

    let mut added = 0;
    for profession in professions.iter().filter(|p| !p.recipes_bootstrapped) {
      let (inserted, complete) = self.populate_profession(profession, token).await?;
      added += inserted;
      if complete {
        self
          .store
          .mark_recipes_bootstrapped(profession.id)
          .await
          .map_err(|e| SyncError::Store(boxed(e)))?;
      }
    }

    if added > 0 {
      info!(added, "recipe catalog populated");
    }
    Ok(added)
  }

  /// Returns the rows written and whether every tier was fetched.
  async fn populate_profession(
    &self,
    profession: &Profession,
    token: &AccessToken,
  ) -> Result<(usize, bool)> {
    let tiers = match self.source.fetch_profession_skill_tiers(profession.external_id, token).await {
      Ok(tiers) => tiers,
      Err(err) => {
        warn!(profession = %profession.name, error = %err, "failed to fetch skill tiers");
        return Ok((0, false));
      }
    };
    if tiers.is_empty() {
      debug!(profession = %profession.name, "profession has no skill tiers");
    }

    let mut added = 0;
    let mut complete = true;
    for tier in tiers {
      let categories = match self
        .source
        .fetch_recipes_for_tier(profession.external_id, tier.id, token)
        .await
      {
        Ok(categories) => categories,
        Err(err) => {
          warn!(profession = %profession.name, tier = tier.id, error = %err, "failed to fetch tier recipes");
          complete = false;
          continue;
        }
      };

      // Categories may repeat a recipe; keep the first listing of each name.
      let mut seen = HashSet::new();
      for recipe in categories.into_iter().flat_map(|c| c.recipes) {
        if !seen.insert(recipe.name.clone()) {
          continue;
        }
        let inserted = self
          .store
          .insert_recipe_if_absent(NewRecipe {
            profession_id:   profession.id,
            skill_tier_id:   Some(tier.id),
            skill_tier_name: Some(tier.name.clone()),
            external_id:     recipe.id,
            name:            recipe.name,
          })
          .await
          .map_err(|e| SyncError::Store(boxed(e)))?;
        if inserted {
          added += 1;
        }
      }
    }

    debug!(profession = %profession.name, added, complete, "profession recipes populated");
    Ok((added, complete))
  }
}
