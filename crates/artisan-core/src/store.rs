//! Storage traits.
//!
//! [`GuildStore`] is the persistence contract the sync engine writes
//! through: catalog inserts, member upserts, knowledge reconciliation and the
//! end-of-run cleanups. [`GuildDirectory`] is the read-mostly query layer the
//! presentation side consumes, plus the self-service claim operations.
//!
//! Both are implemented by storage backends (e.g. `artisan-store-sqlite`).
//! All methods return `Send` futures so the traits can be used from
//! multi-threaded async runtimes, and concurrent calls for distinct members
//! must not require external locking.

use std::future::Future;

use crate::{
  catalog::{
    Crafter, KnowledgeDelta, NewRecipe, Profession, ProfessionId, Recipe, RecipeId,
  },
  member::{Departures, Member, MemberId, MemberUpsert, MemberUpsertResult},
  role::MainRole,
  roster::RosterMember,
};

// ─── Sync-facing persistence ─────────────────────────────────────────────────

pub trait GuildStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Profession catalog ────────────────────────────────────────────────

  fn count_professions(
    &self,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Insert unless a profession with this external id or name exists.
  /// Returns `true` if a row was written.
  fn insert_profession_if_absent(
    &self,
    external_id: i64,
    name: String,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn list_professions(
    &self,
  ) -> impl Future<Output = Result<Vec<Profession>, Self::Error>> + Send + '_;

  /// Case-insensitive lookup by display name.
  fn find_profession_by_name<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Option<Profession>, Self::Error>> + Send + 'a;

  // ── Recipe catalog ────────────────────────────────────────────────────

  fn count_recipes(
    &self,
    profession_id: Option<ProfessionId>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Insert unless `(profession_id, external_id)` exists. Returns `true` if a
  /// row was written.
  fn insert_recipe_if_absent(
    &self,
    recipe: NewRecipe,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Map external recipe ids to local rows of `profession_id`. Ids with no
  /// catalog row are absent from the result.
  fn resolve_recipes<'a>(
    &'a self,
    profession_id: ProfessionId,
    external_ids: &'a [i64],
  ) -> impl Future<Output = Result<Vec<Recipe>, Self::Error>> + Send + 'a;

  /// Flag a profession whose every skill tier was fetched and stored, so
  /// later bootstrap passes skip it.
  fn mark_recipes_bootstrapped(
    &self,
    profession_id: ProfessionId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn set_recipe_item_id(
    &self,
    recipe_id: RecipeId,
    item_id: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Members and knowledge ─────────────────────────────────────────────

  /// Insert keyed by `(name, realm)`, or update class, spec and role.
  fn upsert_member(
    &self,
    input: MemberUpsert,
  ) -> impl Future<Output = Result<MemberUpsertResult, Self::Error>> + Send + '_;

  /// Make the knowledge rows of `(member, profession)` exactly `recipe_ids`:
  /// delete rows for recipes outside the set, insert missing ones.
  fn reconcile_knowledge<'a>(
    &'a self,
    member_id: MemberId,
    profession_id: ProfessionId,
    recipe_ids: &'a [RecipeId],
  ) -> impl Future<Output = Result<KnowledgeDelta, Self::Error>> + Send + 'a;

  /// Delete the member's knowledge rows under every profession outside
  /// `keep`. Returns the number of rows removed.
  fn retain_professions<'a>(
    &'a self,
    member_id: MemberId,
    keep: &'a [ProfessionId],
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + 'a;

  /// Delete every member whose `(name, realm)` is not in `current`, deleting
  /// its knowledge rows first.
  fn remove_departed_members<'a>(
    &'a self,
    current: &'a [RosterMember],
  ) -> impl Future<Output = Result<Departures, Self::Error>> + Send + 'a;

  /// Delete knowledge rows whose member or recipe no longer exists. Returns
  /// the number of rows removed.
  fn sweep_orphaned_knowledge(
    &self,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;
}

// ─── Query layer and claims ──────────────────────────────────────────────────

pub trait GuildDirectory: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Knowledge search ──────────────────────────────────────────────────

  /// Crafters of any recipe whose name contains `fragment`, ignoring case.
  fn search_by_recipe_name<'a>(
    &'a self,
    fragment: &'a str,
  ) -> impl Future<Output = Result<Vec<Crafter>, Self::Error>> + Send + 'a;

  /// Crafters of any recipe producing `item_id`.
  fn search_by_item_id(
    &self,
    item_id: i64,
  ) -> impl Future<Output = Result<Vec<Crafter>, Self::Error>> + Send + '_;

  // ── Member listings ───────────────────────────────────────────────────

  fn get_member_by_name<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Option<Member>, Self::Error>> + Send + 'a;

  /// Members with at least one knowledge row under the named profession.
  fn members_by_profession<'a>(
    &'a self,
    profession: &'a str,
  ) -> impl Future<Output = Result<Vec<Member>, Self::Error>> + Send + 'a;

  /// Members whose effective main role (see [`Member::main_role`]) is `role`.
  fn members_by_role(
    &self,
    role: MainRole,
  ) -> impl Future<Output = Result<Vec<Member>, Self::Error>> + Send + '_;

  fn members_by_class<'a>(
    &'a self,
    class: &'a str,
  ) -> impl Future<Output = Result<Vec<Member>, Self::Error>> + Send + 'a;

  fn claimed_members(
    &self,
    mains_only: bool,
  ) -> impl Future<Output = Result<Vec<Member>, Self::Error>> + Send + '_;

  fn unclaimed_members(
    &self,
  ) -> impl Future<Output = Result<Vec<Member>, Self::Error>> + Send + '_;

  /// Names of unclaimed members containing `fragment`, for autocompletion.
  fn unclaimed_names_matching<'a>(
    &'a self,
    fragment: &'a str,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + 'a;

  /// Distinct profession names the member has knowledge under.
  fn professions_for_member<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + 'a;

  // ── Catalog browsing ──────────────────────────────────────────────────

  fn get_recipe(
    &self,
    id: RecipeId,
  ) -> impl Future<Output = Result<Option<Recipe>, Self::Error>> + Send + '_;

  fn list_recipes(
    &self,
    limit: usize,
    offset: usize,
  ) -> impl Future<Output = Result<Vec<Recipe>, Self::Error>> + Send + '_;

  // ── Claims ────────────────────────────────────────────────────────────

  /// Link the named member to `owner`.
  ///
  /// Fails with [`crate::Error::MemberNotFound`] or
  /// [`crate::Error::AlreadyClaimed`]. The claim becomes the owner's main
  /// when `make_main` is set or the owner has no other claimed member.
  fn claim_member<'a>(
    &'a self,
    name: &'a str,
    owner: &'a str,
    make_main: bool,
  ) -> impl Future<Output = Result<Member, Self::Error>> + Send + 'a;

  /// Make the named member `owner`'s only main. Fails with
  /// [`crate::Error::NotOwner`] if `owner` has not claimed it.
  fn set_main<'a>(
    &'a self,
    name: &'a str,
    owner: &'a str,
  ) -> impl Future<Output = Result<Member, Self::Error>> + Send + 'a;

  /// Clear the owner link and main flag.
  fn unclaim_member<'a>(
    &'a self,
    name: &'a str,
    owner: &'a str,
  ) -> impl Future<Output = Result<Member, Self::Error>> + Send + 'a;

  fn list_owned<'a>(
    &'a self,
    owner: &'a str,
  ) -> impl Future<Output = Result<Vec<Member>, Self::Error>> + Send + 'a;
}
