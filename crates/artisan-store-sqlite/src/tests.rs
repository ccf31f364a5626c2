//! Integration tests for `SqliteStore` against an in-memory database.

use artisan_core::{
  catalog::{NewRecipe, ProfessionId, RecipeId},
  member::{MemberId, MemberUpsert, UpsertOutcome},
  role::MainRole,
  roster::RosterMember,
  store::{GuildDirectory, GuildStore},
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn upsert(name: &str, class: Option<&str>, spec: Option<&str>) -> MemberUpsert {
  let role = match (spec, class) {
    (Some(s), Some(c)) => artisan_core::role::derive_main_role(s, c),
    _ => None,
  };
  MemberUpsert {
    name:  name.into(),
    realm: "stormrage".into(),
    class: class.map(str::to_owned),
    spec:  spec.map(str::to_owned),
    role,
  }
}

async fn add_member(s: &SqliteStore, name: &str) -> MemberId {
  s.upsert_member(upsert(name, Some("Shaman"), Some("Restoration")))
    .await
    .unwrap()
    .id
}

/// Seed one profession with recipes `external_ids`, returning local ids.
async fn seed_catalog(
  s: &SqliteStore,
  profession: &str,
  external_ids: &[(i64, &str)],
) -> (ProfessionId, Vec<RecipeId>) {
  s.insert_profession_if_absent(164, profession.into()).await.unwrap();
  let prof = s.find_profession_by_name(profession).await.unwrap().unwrap();
  for (external_id, name) in external_ids {
    s.insert_recipe_if_absent(NewRecipe {
      profession_id:   prof.id,
      skill_tier_id:   Some(2477),
      skill_tier_name: Some("Classic Blacksmithing".into()),
      external_id:     *external_id,
      name:            (*name).into(),
    })
    .await
    .unwrap();
  }
  let ids: Vec<i64> = external_ids.iter().map(|(id, _)| *id).collect();
  let recipes = s.resolve_recipes(prof.id, &ids).await.unwrap();
  (prof.id, recipes.into_iter().map(|r| r.id).collect())
}

// ─── Catalog ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn profession_insert_is_idempotent() {
  let s = store().await;
  assert!(s.insert_profession_if_absent(171, "Alchemy".into()).await.unwrap());
  assert!(!s.insert_profession_if_absent(171, "Alchemy".into()).await.unwrap());
  // Same name under a different id is also a duplicate.
  assert!(!s.insert_profession_if_absent(999, "Alchemy".into()).await.unwrap());
  assert_eq!(s.count_professions().await.unwrap(), 1);
}

#[tokio::test]
async fn find_profession_ignores_case() {
  let s = store().await;
  s.insert_profession_if_absent(171, "Alchemy".into()).await.unwrap();
  let found = s.find_profession_by_name("alchemy").await.unwrap().unwrap();
  assert_eq!(found.external_id, 171);
  assert!(s.find_profession_by_name("Mining").await.unwrap().is_none());
}

#[tokio::test]
async fn recipe_insert_is_idempotent_per_profession() {
  let s = store().await;
  let (prof, ids) = seed_catalog(&s, "Blacksmithing", &[(501, "Copper Bracers")]).await;
  assert_eq!(ids.len(), 1);

  let again = s
    .insert_recipe_if_absent(NewRecipe {
      profession_id:   prof,
      skill_tier_id:   None,
      skill_tier_name: None,
      external_id:     501,
      name:            "Copper Bracers".into(),
    })
    .await
    .unwrap();
  assert!(!again);
  assert_eq!(s.count_recipes(Some(prof)).await.unwrap(), 1);
  assert_eq!(s.count_recipes(None).await.unwrap(), 1);
}

#[tokio::test]
async fn resolve_recipes_skips_unknown_ids() {
  let s = store().await;
  let (prof, _) =
    seed_catalog(&s, "Blacksmithing", &[(501, "Copper Bracers"), (502, "Fel Iron Plate")]).await;

  let resolved = s.resolve_recipes(prof, &[501, 999, 502, 501]).await.unwrap();
  let external: Vec<i64> = resolved.iter().map(|r| r.external_id).collect();
  assert_eq!(external, vec![501, 502]);
  assert_eq!(resolved[0].profession_name, "Blacksmithing");
}

#[tokio::test]
async fn set_recipe_item_id_is_visible_to_item_search() {
  let s = store().await;
  let (prof, ids) = seed_catalog(&s, "Blacksmithing", &[(501, "Copper Bracers")]).await;
  let thrall = add_member(&s, "Thrall").await;
  s.reconcile_knowledge(thrall, prof, &ids).await.unwrap();

  s.set_recipe_item_id(ids[0], 2853).await.unwrap();
  let crafters = s.search_by_item_id(2853).await.unwrap();
  assert_eq!(crafters.len(), 1);
  assert_eq!(crafters[0].member_name, "Thrall");
  assert_eq!(crafters[0].item_id, Some(2853));
}

#[tokio::test]
async fn bootstrap_flag_is_recorded_per_profession() {
  let s = store().await;
  let (smithing, _) = seed_catalog(&s, "Blacksmithing", &[]).await;
  s.insert_profession_if_absent(171, "Alchemy".into()).await.unwrap();
  let found = s.find_profession_by_name("Blacksmithing").await.unwrap().unwrap();
  assert!(!found.recipes_bootstrapped);

  s.mark_recipes_bootstrapped(smithing).await.unwrap();
  let flags: Vec<(String, bool)> = s
    .list_professions()
    .await
    .unwrap()
    .into_iter()
    .map(|p| (p.name, p.recipes_bootstrapped))
    .collect();
  assert_eq!(flags, vec![("Alchemy".to_owned(), false), ("Blacksmithing".to_owned(), true)]);
}

// ─── Members ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn upsert_reports_insert_update_unchanged() {
  let s = store().await;

  let first = s.upsert_member(upsert("Thrall", Some("Shaman"), Some("Enhancement"))).await.unwrap();
  assert_eq!(first.outcome, UpsertOutcome::Inserted);

  let same = s.upsert_member(upsert("Thrall", Some("Shaman"), Some("Enhancement"))).await.unwrap();
  assert_eq!(same.outcome, UpsertOutcome::Unchanged);
  assert_eq!(same.id, first.id);

  let respec = s.upsert_member(upsert("Thrall", Some("Shaman"), Some("Restoration"))).await.unwrap();
  assert_eq!(respec.outcome, UpsertOutcome::Updated);

  let m = s.get_member_by_name("thrall").await.unwrap().unwrap();
  assert_eq!(m.spec.as_deref(), Some("Restoration"));
  assert_eq!(m.role, Some(MainRole::Healer));
}

#[tokio::test]
async fn upsert_without_summary_keeps_class_and_spec() {
  let s = store().await;
  s.upsert_member(upsert("Thrall", Some("Shaman"), Some("Restoration"))).await.unwrap();

  let result = s.upsert_member(upsert("Thrall", None, None)).await.unwrap();
  assert_eq!(result.outcome, UpsertOutcome::Unchanged);

  let m = s.get_member_by_name("Thrall").await.unwrap().unwrap();
  assert_eq!(m.class.as_deref(), Some("Shaman"));
  assert_eq!(m.role, Some(MainRole::Healer));
}

#[tokio::test]
async fn same_name_on_two_realms_are_distinct_members() {
  let s = store().await;
  let a = s.upsert_member(upsert("Thrall", Some("Shaman"), None)).await.unwrap();
  let b = s
    .upsert_member(MemberUpsert { realm: "draenor".into(), ..upsert("Thrall", Some("Shaman"), None) })
    .await
    .unwrap();
  assert_ne!(a.id, b.id);
  assert_eq!(b.outcome, UpsertOutcome::Inserted);
}

// ─── Knowledge ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn reconcile_inserts_then_shrinks() {
  let s = store().await;
  let (prof, ids) = seed_catalog(
    &s,
    "Blacksmithing",
    &[(501, "Copper Bracers"), (502, "Fel Iron Plate"), (503, "Adamantite Maul")],
  )
  .await;
  let thrall = add_member(&s, "Thrall").await;

  let delta = s.reconcile_knowledge(thrall, prof, &ids).await.unwrap();
  assert_eq!((delta.added, delta.removed), (3, 0));

  let again = s.reconcile_knowledge(thrall, prof, &ids).await.unwrap();
  assert_eq!((again.added, again.removed), (0, 0));

  let shrink = s.reconcile_knowledge(thrall, prof, &ids[..1]).await.unwrap();
  assert_eq!((shrink.added, shrink.removed), (0, 2));

  let crafters = s.search_by_recipe_name("plate").await.unwrap();
  assert!(crafters.is_empty());
  let crafters = s.search_by_recipe_name("bracers").await.unwrap();
  assert_eq!(crafters.len(), 1);
}

#[tokio::test]
async fn reconcile_to_empty_clears_profession_only() {
  let s = store().await;
  let (smith, smith_ids) = seed_catalog(&s, "Blacksmithing", &[(501, "Copper Bracers")]).await;
  s.insert_profession_if_absent(171, "Alchemy".into()).await.unwrap();
  let alchemy = s.find_profession_by_name("Alchemy").await.unwrap().unwrap().id;
  s.insert_recipe_if_absent(NewRecipe {
    profession_id:   alchemy,
    skill_tier_id:   None,
    skill_tier_name: None,
    external_id:     701,
    name:            "Elixir of Giants".into(),
  })
  .await
  .unwrap();
  let alchemy_ids: Vec<i64> =
    s.resolve_recipes(alchemy, &[701]).await.unwrap().into_iter().map(|r| r.id).collect();

  let thrall = add_member(&s, "Thrall").await;
  s.reconcile_knowledge(thrall, smith, &smith_ids).await.unwrap();
  s.reconcile_knowledge(thrall, alchemy, &alchemy_ids).await.unwrap();

  let cleared = s.reconcile_knowledge(thrall, smith, &[]).await.unwrap();
  assert_eq!(cleared.removed, 1);
  assert_eq!(s.professions_for_member("Thrall").await.unwrap(), vec!["Alchemy".to_owned()]);
}

#[tokio::test]
async fn departed_members_lose_knowledge_first() {
  let s = store().await;
  let (prof, ids) = seed_catalog(&s, "Blacksmithing", &[(501, "Copper Bracers")]).await;
  let thrall = add_member(&s, "Thrall").await;
  let jaina = add_member(&s, "Jaina").await;
  s.reconcile_knowledge(thrall, prof, &ids).await.unwrap();
  s.reconcile_knowledge(jaina, prof, &ids).await.unwrap();

  let departures = s
    .remove_departed_members(&[RosterMember::new("Thrall", "stormrage")])
    .await
    .unwrap();
  assert_eq!(departures.members, 1);
  assert_eq!(departures.knowledge_rows, 1);

  assert!(s.get_member_by_name("Jaina").await.unwrap().is_none());
  let crafters = s.search_by_recipe_name("Copper").await.unwrap();
  assert_eq!(crafters.len(), 1);
  assert_eq!(crafters[0].member_name, "Thrall");
}

#[tokio::test]
async fn sweep_removes_orphaned_rows() {
  let s = store().await;
  let (prof, ids) = seed_catalog(&s, "Blacksmithing", &[(501, "Copper Bracers")]).await;
  let thrall = add_member(&s, "Thrall").await;
  s.reconcile_knowledge(thrall, prof, &ids).await.unwrap();

  s.conn
    .call(move |conn| {
      conn.execute_batch(&format!(
        "PRAGMA foreign_keys = OFF;
         INSERT INTO member_recipes (member_id, profession_id, recipe_id) VALUES (9999, {prof}, {});
         PRAGMA foreign_keys = ON;",
        ids[0]
      ))?;
      Ok(())
    })
    .await
    .unwrap();

  assert_eq!(s.sweep_orphaned_knowledge().await.unwrap(), 1);
  assert_eq!(s.sweep_orphaned_knowledge().await.unwrap(), 0);
  assert_eq!(s.search_by_recipe_name("Copper").await.unwrap().len(), 1);
}

// ─── Queries ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn recipe_search_escapes_like_wildcards() {
  let s = store().await;
  let (prof, ids) = seed_catalog(&s, "Blacksmithing", &[(501, "Copper Bracers")]).await;
  let thrall = add_member(&s, "Thrall").await;
  s.reconcile_knowledge(thrall, prof, &ids).await.unwrap();

  assert!(s.search_by_recipe_name("%").await.unwrap().is_empty());
  assert!(s.search_by_recipe_name("C_pper").await.unwrap().is_empty());
  assert_eq!(s.search_by_recipe_name("COPPER").await.unwrap().len(), 1);
}

#[tokio::test]
async fn members_by_role_derives_when_column_is_null() {
  let s = store().await;
  s.upsert_member(MemberUpsert { role: None, ..upsert("Varian", Some("Warrior"), Some("Protection")) })
    .await
    .unwrap();
  s.upsert_member(upsert("Thrall", Some("Shaman"), Some("Restoration"))).await.unwrap();

  let tanks = s.members_by_role(MainRole::Tank).await.unwrap();
  assert_eq!(tanks.len(), 1);
  assert_eq!(tanks[0].name, "Varian");
  assert_eq!(tanks[0].role, None);

  let healers = s.members_by_role(MainRole::Healer).await.unwrap();
  assert_eq!(healers[0].name, "Thrall");
}

#[tokio::test]
async fn members_by_profession_and_class() {
  let s = store().await;
  let (prof, ids) = seed_catalog(&s, "Blacksmithing", &[(501, "Copper Bracers")]).await;
  let thrall = add_member(&s, "Thrall").await;
  s.reconcile_knowledge(thrall, prof, &ids).await.unwrap();
  s.upsert_member(upsert("Jaina", Some("Mage"), Some("Frost"))).await.unwrap();

  let smiths = s.members_by_profession("blacksmithing").await.unwrap();
  assert_eq!(smiths.len(), 1);
  assert_eq!(smiths[0].name, "Thrall");

  let mages = s.members_by_class("MAGE").await.unwrap();
  assert_eq!(mages.len(), 1);
  assert_eq!(mages[0].name, "Jaina");
}

#[tokio::test]
async fn list_recipes_pages_by_id() {
  let s = store().await;
  seed_catalog(
    &s,
    "Blacksmithing",
    &[(501, "Copper Bracers"), (502, "Fel Iron Plate"), (503, "Adamantite Maul")],
  )
  .await;

  let page = s.list_recipes(2, 1).await.unwrap();
  let names: Vec<&str> = page.iter().map(|r| r.name.as_str()).collect();
  assert_eq!(names, vec!["Fel Iron Plate", "Adamantite Maul"]);

  let one = s.get_recipe(page[0].id).await.unwrap().unwrap();
  assert_eq!(one.external_id, 502);
  assert!(s.get_recipe(9999).await.unwrap().is_none());
}

// ─── Claims ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn first_claim_becomes_main() {
  let s = store().await;
  add_member(&s, "Thrall").await;
  add_member(&s, "Jaina").await;

  let thrall = s.claim_member("thrall", "user#1", false).await.unwrap();
  assert_eq!(thrall.owner.as_deref(), Some("user#1"));
  assert!(thrall.is_main);

  let jaina = s.claim_member("Jaina", "user#1", false).await.unwrap();
  assert!(!jaina.is_main);

  let owned = s.list_owned("user#1").await.unwrap();
  let names: Vec<&str> = owned.iter().map(|m| m.name.as_str()).collect();
  assert_eq!(names, vec!["Jaina", "Thrall"]);
}

#[tokio::test]
async fn set_main_keeps_a_single_main() {
  let s = store().await;
  add_member(&s, "Thrall").await;
  add_member(&s, "Jaina").await;
  s.claim_member("Thrall", "user#1", false).await.unwrap();
  s.claim_member("Jaina", "user#1", false).await.unwrap();

  let jaina = s.set_main("Jaina", "user#1").await.unwrap();
  assert!(jaina.is_main);

  let mains = s.claimed_members(true).await.unwrap();
  assert_eq!(mains.len(), 1);
  assert_eq!(mains[0].name, "Jaina");
  assert_eq!(s.claimed_members(false).await.unwrap().len(), 2);
}

#[tokio::test]
async fn claim_conflicts_are_domain_errors() {
  let s = store().await;
  add_member(&s, "Thrall").await;
  s.claim_member("Thrall", "user#1", false).await.unwrap();

  let err = s.claim_member("Thrall", "user#2", false).await.unwrap_err();
  assert!(matches!(err, Error::Core(artisan_core::Error::AlreadyClaimed(_))));

  let err = s.set_main("Thrall", "user#2").await.unwrap_err();
  assert!(matches!(err, Error::Core(artisan_core::Error::NotOwner(_))));

  let err = s.claim_member("Nobody", "user#1", false).await.unwrap_err();
  assert!(matches!(err, Error::Core(artisan_core::Error::MemberNotFound(_))));
}

#[tokio::test]
async fn unclaim_returns_member_to_pool() {
  let s = store().await;
  add_member(&s, "Thrall").await;
  add_member(&s, "Thrall-Alt").await;
  s.claim_member("Thrall", "user#1", false).await.unwrap();

  let names = s.unclaimed_names_matching("thr", 10).await.unwrap();
  assert_eq!(names, vec!["Thrall-Alt".to_owned()]);

  let released = s.unclaim_member("Thrall", "user#1").await.unwrap();
  assert!(released.owner.is_none());
  assert!(!released.is_main);
  assert_eq!(s.unclaimed_members().await.unwrap().len(), 2);
  assert!(s.list_owned("user#1").await.unwrap().is_empty());
}

// ─── Dropped professions ─────────────────────────────────────────────────────

#[tokio::test]
async fn retain_professions_drops_unlisted_knowledge() {
  let s = store().await;
  let (smithing, smith_ids) =
    seed_catalog(&s, "Blacksmithing", &[(501, "Copper Bracers"), (502, "Fel Iron Plate")]).await;
  s.insert_profession_if_absent(171, "Alchemy".into()).await.unwrap();
  let alchemy = s.find_profession_by_name("Alchemy").await.unwrap().unwrap().id;
  s.insert_recipe_if_absent(NewRecipe {
    profession_id:   alchemy,
    skill_tier_id:   None,
    skill_tier_name: None,
    external_id:     601,
    name:            "Elixir of Giants".into(),
  })
  .await
  .unwrap();
  let elixir = s.resolve_recipes(alchemy, &[601]).await.unwrap()[0].id;

  let thrall = add_member(&s, "Thrall").await;
  let jaina = add_member(&s, "Jaina").await;
  s.reconcile_knowledge(thrall, smithing, &smith_ids).await.unwrap();
  s.reconcile_knowledge(thrall, alchemy, &[elixir]).await.unwrap();
  s.reconcile_knowledge(jaina, smithing, &smith_ids[..1]).await.unwrap();

  assert_eq!(s.retain_professions(thrall, &[alchemy]).await.unwrap(), 2);
  assert_eq!(s.professions_for_member("Thrall").await.unwrap(), vec!["Alchemy".to_owned()]);
  assert_eq!(s.professions_for_member("Jaina").await.unwrap(), vec!["Blacksmithing".to_owned()]);

  assert_eq!(s.retain_professions(thrall, &[]).await.unwrap(), 1);
  assert!(s.professions_for_member("Thrall").await.unwrap().is_empty());
  assert_eq!(s.retain_professions(thrall, &[]).await.unwrap(), 0);
}
