//! Router tests against a stub roster source and an in-memory store.

use std::sync::{
  Arc,
  atomic::{AtomicBool, Ordering},
};

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use artisan_core::{
  catalog::NewRecipe,
  member::MemberUpsert,
  roster::{
    AccessToken, CharacterProfessions, CharacterSummary, ProfessionRef, RecipeCategory,
    RecipeDetails, RosterMember, RosterSource, SkillTierRef,
  },
  store::GuildStore,
};
use artisan_store_sqlite::SqliteStore;
use artisan_sync::{SyncConfig, SyncEngine};

use crate::{ApiState, api_router};

// ─── Stub source ─────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
#[error("stub upstream unavailable")]
struct StubError;

/// Serves an empty catalog and a roster that either fails or is empty.
#[derive(Default)]
struct StubSource {
  roster_fails: AtomicBool,
}

impl RosterSource for StubSource {
  type Error = StubError;

  async fn fetch_access_token(&self) -> Result<AccessToken, StubError> {
    Ok(AccessToken::new("stub", None))
  }

  async fn fetch_roster_members(&self, _token: &AccessToken) -> Result<Vec<RosterMember>, StubError> {
    if self.roster_fails.load(Ordering::SeqCst) {
      return Err(StubError);
    }
    Ok(vec![])
  }

  async fn fetch_character_summary(
    &self,
    _realm: &str,
    _name: &str,
    _token: &AccessToken,
  ) -> Result<Option<CharacterSummary>, StubError> {
    Ok(None)
  }

  async fn fetch_character_professions(
    &self,
    _realm: &str,
    _name: &str,
    _token: &AccessToken,
  ) -> Result<Option<CharacterProfessions>, StubError> {
    Ok(None)
  }

  async fn fetch_profession_index(&self, _token: &AccessToken) -> Result<Vec<ProfessionRef>, StubError> {
    Ok(vec![])
  }

  async fn fetch_profession_skill_tiers(
    &self,
    _profession_id: i64,
    _token: &AccessToken,
  ) -> Result<Vec<SkillTierRef>, StubError> {
    Ok(vec![])
  }

  async fn fetch_recipes_for_tier(
    &self,
    _profession_id: i64,
    _tier_id: i64,
    _token: &AccessToken,
  ) -> Result<Vec<RecipeCategory>, StubError> {
    Ok(vec![])
  }

  async fn fetch_recipe_details(&self, _recipe_id: i64, _token: &AccessToken) -> Option<RecipeDetails> {
    None
  }
}

// ─── Fixtures ────────────────────────────────────────────────────────────────

struct Harness {
  router: Router,
  source: Arc<StubSource>,
  engine: Arc<SyncEngine<StubSource, SqliteStore>>,
}

/// Blacksmithing with Copper Bracers, known by Thrall (Enhancement Shaman).
/// Garrosh (Protection Warrior) knows nothing.
async fn harness() -> Harness {
  let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());

  store.insert_profession_if_absent(164, "Blacksmithing".into()).await.unwrap();
  let blacksmithing = store.find_profession_by_name("Blacksmithing").await.unwrap().unwrap();
  store
    .insert_recipe_if_absent(NewRecipe {
      profession_id:   blacksmithing.id,
      skill_tier_id:   Some(2477),
      skill_tier_name: Some("Classic Blacksmithing".into()),
      external_id:     501,
      name:            "Copper Bracers".into(),
    })
    .await
    .unwrap();
  let recipes = store.resolve_recipes(blacksmithing.id, &[501]).await.unwrap();

  let upsert = |name: &str, class: &str, spec: &str| MemberUpsert {
    name:  name.into(),
    realm: "stormrage".into(),
    class: Some(class.into()),
    spec:  Some(spec.into()),
    role:  None,
  };
  let thrall = store.upsert_member(upsert("Thrall", "Shaman", "Enhancement")).await.unwrap();
  store.upsert_member(upsert("Garrosh", "Warrior", "Protection")).await.unwrap();
  store
    .reconcile_knowledge(thrall.id, blacksmithing.id, &[recipes[0].id])
    .await
    .unwrap();

  let source = Arc::new(StubSource::default());
  let engine = Arc::new(SyncEngine::new(source.clone(), store.clone(), SyncConfig::default()));
  let router = api_router(ApiState::new(store, engine.clone()));
  Harness { router, source, engine }
}

async fn call(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
  let builder = Request::builder().method(method).uri(uri);
  let req = match body {
    Some(body) => builder
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(body.to_string()))
      .unwrap(),
    None => builder.body(Body::empty()).unwrap(),
  };
  let resp = router.clone().oneshot(req).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
  (status, json)
}

fn names(json: &Value) -> Vec<&str> {
  json
    .as_array()
    .unwrap()
    .iter()
    .map(|m| m["name"].as_str().unwrap())
    .collect()
}

// ── Crafters ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn crafters_requires_a_query() {
  let h = harness().await;
  let (status, body) = call(&h.router, "GET", "/crafters", None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].as_str().unwrap().contains("recipe"));
}

#[tokio::test]
async fn crafters_by_partial_recipe_name() {
  let h = harness().await;
  let (status, body) = call(&h.router, "GET", "/crafters?recipe=copper", None).await;
  assert_eq!(status, StatusCode::OK);
  let rows = body.as_array().unwrap();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0]["member_name"], "Thrall");
  assert_eq!(rows[0]["recipe_name"], "Copper Bracers");
}

// ── Members ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn members_by_role_parses_case_insensitively() {
  let h = harness().await;
  let (status, body) = call(&h.router, "GET", "/members?role=tank", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(names(&body), vec!["Garrosh"]);
  assert_eq!(body[0]["main_role"], "Tank");
}

#[tokio::test]
async fn members_rejects_unknown_role_and_missing_filter() {
  let h = harness().await;
  let (status, _) = call(&h.router, "GET", "/members?role=bogus", None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) = call(&h.router, "GET", "/members", None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) = call(&h.router, "GET", "/members?role=tank&class=Warrior", None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn members_by_profession() {
  let h = harness().await;
  let (status, body) = call(&h.router, "GET", "/members?profession=blacksmithing", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(names(&body), vec!["Thrall"]);
}

#[tokio::test]
async fn get_member_and_its_professions() {
  let h = harness().await;
  let (status, body) = call(&h.router, "GET", "/members/thrall", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["name"], "Thrall");
  assert_eq!(body["main_role"], "Melee DPS");

  let (_, body) = call(&h.router, "GET", "/members/Thrall/professions", None).await;
  assert_eq!(body, json!(["Blacksmithing"]));

  let (status, _) = call(&h.router, "GET", "/members/Nobody", None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ── Claims ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn claim_conflicts_and_owner_listing() {
  let h = harness().await;
  let (status, body) =
    call(&h.router, "POST", "/members/Thrall/claim", Some(json!({ "owner": "alice" }))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["owner"], "alice");
  assert_eq!(body["is_main"], true);

  let (status, _) =
    call(&h.router, "POST", "/members/Thrall/claim", Some(json!({ "owner": "bob" }))).await;
  assert_eq!(status, StatusCode::CONFLICT);

  let (status, _) =
    call(&h.router, "POST", "/members/Thrall/unclaim", Some(json!({ "owner": "bob" }))).await;
  assert_eq!(status, StatusCode::CONFLICT);

  let (_, body) = call(&h.router, "GET", "/owners/alice/members", None).await;
  assert_eq!(names(&body), vec!["Thrall"]);

  let (_, body) = call(&h.router, "GET", "/members/unclaimed/names?q=gar", None).await;
  assert_eq!(body, json!(["Garrosh"]));
}

#[tokio::test]
async fn claim_unknown_member_is_404() {
  let h = harness().await;
  let (status, _) =
    call(&h.router, "POST", "/members/Nobody/claim", Some(json!({ "owner": "alice" }))).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn claim_requires_owner() {
  let h = harness().await;
  let (status, _) =
    call(&h.router, "POST", "/members/Thrall/claim", Some(json!({ "owner": "  " }))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ── Catalog ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn catalog_browsing() {
  let h = harness().await;
  let (_, body) = call(&h.router, "GET", "/professions", None).await;
  assert_eq!(body[0]["name"], "Blacksmithing");

  let (_, body) = call(&h.router, "GET", "/recipes?limit=500", None).await;
  let id = body[0]["id"].as_i64().unwrap();

  let (status, body) = call(&h.router, "GET", &format!("/recipes/{id}"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["external_id"], 501);

  let (status, _) = call(&h.router, "GET", "/recipes/9999", None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ── Sync ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn sync_status_reflects_guard() {
  let h = harness().await;
  let (_, body) = call(&h.router, "GET", "/sync", None).await;
  assert_eq!(body, json!({ "in_progress": false }));

  h.engine.set_sync_in_progress(true);
  let (_, body) = call(&h.router, "GET", "/sync", None).await;
  assert_eq!(body, json!({ "in_progress": true }));

  let (status, _) = call(&h.router, "POST", "/sync", None).await;
  assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn failing_roster_is_bad_gateway() {
  let h = harness().await;
  h.source.roster_fails.store(true, Ordering::SeqCst);

  let (status, body) = call(&h.router, "POST", "/sync", None).await;
  assert_eq!(status, StatusCode::BAD_GATEWAY);
  assert!(body["error"].is_string());
  assert!(!h.engine.is_sync_in_progress());
}
