//! [`SyncEngine`]: full-roster reconciliation.

use std::{
  collections::{HashMap, HashSet},
  sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
  },
};

use chrono::Utc;
use futures::future::join_all;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use artisan_core::{
  catalog::{KnowledgeDelta, NewRecipe, ProfessionId, Recipe, RecipeId},
  member::{Departures, MemberId, MemberUpsert, UpsertOutcome},
  report::SyncReport,
  role::derive_main_role,
  roster::{AccessToken, ProfessionKnowledge, RosterMember, RosterSource},
  store::GuildStore,
};

use crate::{
  best_effort,
  catalog::{BootstrapReport, CatalogBootstrap},
  error::{MemberSyncError, Result, SyncError, boxed},
};

/// Produced-item ids looked up during one run, keyed by external recipe id.
type ItemCache = Mutex<HashMap<i64, Option<i64>>>;

// ─── Config ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SyncConfig {
  /// Members synced concurrently; batches run one after another.
  pub batch_size:            usize,
  /// Look up and record produced-item ids for recipes that lack one.
  pub resolve_crafted_items: bool,
  /// Run the catalog bootstrap after the roster fetch.
  pub bootstrap_catalog:     bool,
  /// Locale used to pick localized catalog names.
  pub locale:                String,
}

impl Default for SyncConfig {
  fn default() -> Self {
    Self {
      batch_size:            5,
      resolve_crafted_items: true,
      bootstrap_catalog:     true,
      locale:                "en_US".into(),
    }
  }
}

// ─── Re-entrancy guard ───────────────────────────────────────────────────────

/// Holds the in-progress flag for the lifetime of one run.
struct SyncGuard<'a>(&'a AtomicBool);

impl<'a> SyncGuard<'a> {
  fn acquire(flag: &'a AtomicBool) -> Option<Self> {
    flag
      .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
      .ok()
      .map(|_| Self(flag))
  }
}

impl Drop for SyncGuard<'_> {
  fn drop(&mut self) { self.0.store(false, Ordering::Release); }
}

// ─── Counters ────────────────────────────────────────────────────────────────

/// Run totals, bumped once per completed member.
#[derive(Default)]
struct Counters {
  processed:       AtomicUsize,
  failed:          AtomicUsize,
  added:           AtomicUsize,
  updated:         AtomicUsize,
  recipes_added:   AtomicUsize,
  recipes_removed: AtomicUsize,
}

impl Counters {
  fn settled(&self) -> usize {
    self.processed.load(Ordering::Relaxed) + self.failed.load(Ordering::Relaxed)
  }

  fn record(&self, outcome: &MemberOutcome) {
    match outcome.upsert {
      UpsertOutcome::Inserted => self.added.fetch_add(1, Ordering::Relaxed),
      UpsertOutcome::Updated => self.updated.fetch_add(1, Ordering::Relaxed),
      UpsertOutcome::Unchanged => 0,
    };
    self.recipes_added.fetch_add(outcome.knowledge.added, Ordering::Relaxed);
    self.recipes_removed.fetch_add(outcome.knowledge.removed, Ordering::Relaxed);
    self.processed.fetch_add(1, Ordering::Relaxed);
  }
}

struct MemberOutcome {
  upsert:    UpsertOutcome,
  knowledge: KnowledgeDelta,
}

// ─── Engine ──────────────────────────────────────────────────────────────────

/// Reconciles a [`GuildStore`] against the roster served by a
/// [`RosterSource`].
///
/// At most one run is active per engine; a second trigger while one is in
/// flight fails with [`SyncError::AlreadyRunning`] before anything is fetched.
pub struct SyncEngine<R, S> {
  source:      Arc<R>,
  store:       Arc<S>,
  config:      SyncConfig,
  in_progress: AtomicBool,
}

impl<R, S> SyncEngine<R, S>
where
  R: RosterSource,
  S: GuildStore,
{
  pub fn new(source: Arc<R>, store: Arc<S>, config: SyncConfig) -> Self {
    Self { source, store, config, in_progress: AtomicBool::new(false) }
  }

  pub fn is_sync_in_progress(&self) -> bool { self.in_progress.load(Ordering::Acquire) }

  /// Force the in-progress flag, e.g. while an external caller holds its own
  /// long-running operation.
  pub fn set_sync_in_progress(&self, value: bool) {
    self.in_progress.store(value, Ordering::Release);
  }

  /// Obtain a token and sync the full roster.
  pub async fn sync_roster(&self) -> Result<SyncReport> {
    self.sync_roster_with_progress(|_, _| {}).await
  }

  /// Like [`Self::sync_roster`], calling `progress(settled, total)` after
  /// every batch, where `settled` counts members processed or failed so far.
  pub async fn sync_roster_with_progress(
    &self,
    progress: impl FnMut(usize, usize) + Send,
  ) -> Result<SyncReport> {
    let _guard = SyncGuard::acquire(&self.in_progress).ok_or(SyncError::AlreadyRunning)?;
    let token = self
      .source
      .fetch_access_token()
      .await
      .map_err(|e| SyncError::Token(boxed(e)))?;
    self.run(&token, progress).await
  }

  /// Sync the full roster with a caller-supplied token.
  pub async fn sync_roster_with_token(&self, token: &AccessToken) -> Result<SyncReport> {
    let _guard = SyncGuard::acquire(&self.in_progress).ok_or(SyncError::AlreadyRunning)?;
    self.run(token, |_, _| {}).await
  }

  /// Run only the catalog bootstrap. Shares the re-entrancy guard with syncs.
  pub async fn bootstrap_catalog(&self) -> Result<BootstrapReport> {
    let _guard = SyncGuard::acquire(&self.in_progress).ok_or(SyncError::AlreadyRunning)?;
    let token = self
      .source
      .fetch_access_token()
      .await
      .map_err(|e| SyncError::Token(boxed(e)))?;
    self.catalog().run(&token).await
  }

  fn catalog(&self) -> CatalogBootstrap<'_, R, S> {
    CatalogBootstrap::new(&*self.source, &*self.store, &self.config.locale)
  }

  async fn run(
    &self,
    token: &AccessToken,
    mut progress: impl FnMut(usize, usize) + Send,
  ) -> Result<SyncReport> {
    let started_at = Utc::now();

    let roster = self
      .source
      .fetch_roster_members(token)
      .await
      .map_err(|e| SyncError::Roster(boxed(e)))?;
    // An empty snapshot would mark every stored member as departed.
    if roster.is_empty() {
      return Err(SyncError::Roster("upstream returned an empty roster".into()));
    }
    let total = roster.len();
    info!(total, batch_size = self.config.batch_size, "starting roster sync");

    if self.config.bootstrap_catalog {
      if let Err(err) = self.catalog().run(token).await {
        warn!(error = %err, "catalog bootstrap failed; continuing with the existing catalog");
      }
    }

    let counters = Counters::default();
    let items = ItemCache::default();

    for batch in roster.chunks(self.config.batch_size.max(1)) {
      join_all(
        batch
          .iter()
          .map(|member| self.sync_member_counted(member, token, &counters, &items)),
      )
      .await;
      progress(counters.settled(), total);
    }

    let departures = match self.store.remove_departed_members(&roster).await {
      Ok(departures) => departures,
      Err(err) => {
        error!(error = %err, "departed member cleanup failed");
        Departures::default()
      }
    };

    let orphans_swept = match self.store.sweep_orphaned_knowledge().await {
      Ok(n) => n,
      Err(err) => {
        error!(error = %err, "orphan sweep failed");
        0
      }
    };

    let report = SyncReport {
      started_at,
      finished_at: Utc::now(),
      members_total: total,
      members_processed: counters.processed.load(Ordering::Relaxed),
      members_failed: counters.failed.load(Ordering::Relaxed),
      members_added: counters.added.load(Ordering::Relaxed),
      members_updated: counters.updated.load(Ordering::Relaxed),
      recipes_added: counters.recipes_added.load(Ordering::Relaxed),
      recipes_removed: counters.recipes_removed.load(Ordering::Relaxed),
      members_departed: departures.members,
      departed_knowledge_removed: departures.knowledge_rows,
      orphans_swept,
    };

    info!(
      processed = report.members_processed,
      failed = report.members_failed,
      added = report.members_added,
      updated = report.members_updated,
      recipes_added = report.recipes_added,
      recipes_removed = report.recipes_removed,
      departed = report.members_departed,
      orphans = report.orphans_swept,
      "roster sync finished"
    );
    Ok(report)
  }

  async fn sync_member_counted(
    &self,
    member: &RosterMember,
    token: &AccessToken,
    counters: &Counters,
    items: &ItemCache,
  ) {
    match self.sync_member(member, token, items).await {
      Ok(outcome) => counters.record(&outcome),
      Err(err) => {
        warn!(name = %member.name, realm = %member.realm, error = %err, "member sync failed");
        counters.failed.fetch_add(1, Ordering::Relaxed);
      }
    }
  }

  async fn sync_member(
    &self,
    member: &RosterMember,
    token: &AccessToken,
    items: &ItemCache,
  ) -> Result<MemberOutcome, MemberSyncError> {
    let summary = self
      .source
      .fetch_character_summary(&member.realm, &member.name, token)
      .await
      .map_err(|e| MemberSyncError::Summary(boxed(e)))?;
    let professions = self
      .source
      .fetch_character_professions(&member.realm, &member.name, token)
      .await
      .map_err(|e| MemberSyncError::Professions(boxed(e)))?;

    if summary.is_none() && professions.is_none() {
      return Err(MemberSyncError::NotFound);
    }
    if summary.is_none() {
      debug!(name = %member.name, realm = %member.realm, "no summary; keeping stored class and spec");
    }

    let (class, spec) = summary.map(|s| (s.class, s.spec)).unwrap_or_default();
    let role = match (spec.as_deref(), class.as_deref()) {
      (Some(spec), Some(class)) => derive_main_role(spec, class),
      _ => None,
    };

    let upsert = self
      .store
      .upsert_member(MemberUpsert {
        name: member.name.clone(),
        realm: member.realm.clone(),
        class,
        spec,
        role,
      })
      .await
      .map_err(|e| MemberSyncError::Store(boxed(e)))?;

    let mut knowledge = KnowledgeDelta::default();
    if let Some(professions) = &professions {
      let mut reported = Vec::new();
      for profession in professions.all() {
        if let Some((profession_id, delta)) = self
          .reconcile_profession(member, upsert.id, profession, token, items)
          .await?
        {
          reported.push(profession_id);
          knowledge += delta;
        }
      }
      // Professions no longer listed upstream keep no knowledge rows.
      knowledge.removed += self
        .store
        .retain_professions(upsert.id, &reported)
        .await
        .map_err(|e| MemberSyncError::Store(boxed(e)))?;
    }

    Ok(MemberOutcome { upsert: upsert.outcome, knowledge })
  }

  /// Make the member's knowledge rows under one profession match upstream.
  /// Returns `None` when the profession is not cataloged.
  async fn reconcile_profession(
    &self,
    member: &RosterMember,
    member_id: MemberId,
    profession: &ProfessionKnowledge,
    token: &AccessToken,
    items: &ItemCache,
  ) -> Result<Option<(ProfessionId, KnowledgeDelta)>, MemberSyncError> {
    let store_err = |e: S::Error| MemberSyncError::Store(boxed(e));

    let Some(catalog) = self
      .store
      .find_profession_by_name(&profession.name)
      .await
      .map_err(store_err)?
    else {
      warn!(
        name = %member.name,
        realm = %member.realm,
        profession = %profession.name,
        "profession not in catalog; skipping"
      );
      return Ok(None);
    };

    let external_ids: Vec<i64> = profession.known_recipes().map(|(_, r)| r.id).collect();
    let mut resolved = self
      .store
      .resolve_recipes(catalog.id, &external_ids)
      .await
      .map_err(store_err)?;

    // Recipes added upstream after the catalog was bootstrapped.
    let known: HashSet<i64> = resolved.iter().map(|r| r.external_id).collect();
    let mut inserted = HashSet::new();
    for (tier, recipe) in profession.known_recipes() {
      if known.contains(&recipe.id) || !inserted.insert(recipe.id) {
        continue;
      }
      self
        .store
        .insert_recipe_if_absent(NewRecipe {
          profession_id:   catalog.id,
          skill_tier_id:   tier.tier_id,
          skill_tier_name: tier.tier_name.clone(),
          external_id:     recipe.id,
          name:            recipe.name.clone(),
        })
        .await
        .map_err(store_err)?;
    }
    if !inserted.is_empty() {
      debug!(profession = %catalog.name, count = inserted.len(), "cataloged newly seen recipes");
      resolved = self
        .store
        .resolve_recipes(catalog.id, &external_ids)
        .await
        .map_err(store_err)?;
    }

    if self.config.resolve_crafted_items {
      self.resolve_crafted_items(&resolved, token, items).await;
    }

    let recipe_ids: Vec<RecipeId> = resolved.iter().map(|r| r.id).collect();
    let delta = self
      .store
      .reconcile_knowledge(member_id, catalog.id, &recipe_ids)
      .await
      .map_err(store_err)?;
    Ok(Some((catalog.id, delta)))
  }

  /// Fill in unknown produced-item ids. Failures leave the field empty.
  async fn resolve_crafted_items(&self, recipes: &[Recipe], token: &AccessToken, items: &ItemCache) {
    for recipe in recipes.iter().filter(|r| r.item_id.is_none()) {
      let cached = items.lock().await.get(&recipe.external_id).copied();
      let item_id = match cached {
        Some(item_id) => item_id,
        None => {
          let item_id = self
            .source
            .fetch_recipe_details(recipe.external_id, token)
            .await
            .and_then(|d| d.crafted_item_id);
          items.lock().await.insert(recipe.external_id, item_id);
          item_id
        }
      };

      if let Some(item_id) = item_id {
        best_effort("record crafted item", self.store.set_recipe_item_id(recipe.id, item_id)).await;
      }
    }
  }
}
