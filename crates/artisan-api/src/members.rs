//! Handlers for member listings and self-service claims.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/members` | Exactly one of `?profession=`, `?role=`, `?class=` |
//! | `GET`  | `/members/claimed` | Optional `?mains_only=true` |
//! | `GET`  | `/members/unclaimed` | |
//! | `GET`  | `/members/unclaimed/names` | `?q=<fragment>[&limit=<n>]`, for autocompletion |
//! | `GET`  | `/members/{name}` | 404 if not found |
//! | `GET`  | `/members/{name}/professions` | |
//! | `POST` | `/members/{name}/claim` | Body: `{"owner":"..","main":false}` |
//! | `POST` | `/members/{name}/unclaim` | Body: `{"owner":".."}` |
//! | `POST` | `/members/{name}/main` | Body: `{"owner":".."}` |
//! | `GET`  | `/owners/{owner}/members` | |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

use artisan_core::{
  member::Member,
  role::MainRole,
  roster::RosterSource,
  store::{GuildDirectory, GuildStore},
};

use crate::{ApiState, error::ApiError};

const DEFAULT_NAME_LIMIT: usize = 25;

/// A member with its effective main role alongside the stored columns.
#[derive(Debug, Serialize)]
pub struct MemberView {
  #[serde(flatten)]
  pub member:    Member,
  pub main_role: Option<MainRole>,
}

impl From<Member> for MemberView {
  fn from(member: Member) -> Self {
    Self { main_role: member.main_role(), member }
  }
}

fn views(members: Vec<Member>) -> Json<Vec<MemberView>> {
  Json(members.into_iter().map(MemberView::from).collect())
}

// ─── Listings ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub profession: Option<String>,
  pub role:       Option<String>,
  pub class:      Option<String>,
}

/// `GET /members?profession=..|role=..|class=..`
pub async fn list<R, S>(
  State(state): State<ApiState<R, S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<MemberView>>, ApiError>
where
  R: RosterSource,
  S: GuildStore + GuildDirectory,
{
  let store = &state.store;
  let members = match (params.profession, params.role, params.class) {
    (Some(profession), None, None) => store.members_by_profession(&profession).await,
    (None, Some(role), None) => {
      let role: MainRole = role
        .trim()
        .parse()
        .map_err(|_| ApiError::from_store(artisan_core::Error::UnknownRole(role.clone())))?;
      store.members_by_role(role).await
    }
    (None, None, Some(class)) => store.members_by_class(&class).await,
    _ => {
      return Err(ApiError::BadRequest(
        "exactly one of `profession`, `role` or `class` is required".into(),
      ));
    }
  }
  .map_err(ApiError::from_store)?;

  Ok(views(members))
}

#[derive(Debug, Deserialize)]
pub struct ClaimedParams {
  #[serde(default)]
  pub mains_only: bool,
}

/// `GET /members/claimed[?mains_only=true]`
pub async fn claimed<R, S>(
  State(state): State<ApiState<R, S>>,
  Query(params): Query<ClaimedParams>,
) -> Result<Json<Vec<MemberView>>, ApiError>
where
  R: RosterSource,
  S: GuildStore + GuildDirectory,
{
  let members = state
    .store
    .claimed_members(params.mains_only)
    .await
    .map_err(ApiError::from_store)?;
  Ok(views(members))
}

/// `GET /members/unclaimed`
pub async fn unclaimed<R, S>(
  State(state): State<ApiState<R, S>>,
) -> Result<Json<Vec<MemberView>>, ApiError>
where
  R: RosterSource,
  S: GuildStore + GuildDirectory,
{
  let members = state.store.unclaimed_members().await.map_err(ApiError::from_store)?;
  Ok(views(members))
}

#[derive(Debug, Deserialize)]
pub struct NamesParams {
  #[serde(default)]
  pub q:     String,
  pub limit: Option<usize>,
}

/// `GET /members/unclaimed/names?q=<fragment>[&limit=<n>]`
pub async fn unclaimed_names<R, S>(
  State(state): State<ApiState<R, S>>,
  Query(params): Query<NamesParams>,
) -> Result<Json<Vec<String>>, ApiError>
where
  R: RosterSource,
  S: GuildStore + GuildDirectory,
{
  let names = state
    .store
    .unclaimed_names_matching(&params.q, params.limit.unwrap_or(DEFAULT_NAME_LIMIT))
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(names))
}

/// `GET /members/{name}`
pub async fn get_one<R, S>(
  State(state): State<ApiState<R, S>>,
  Path(name): Path<String>,
) -> Result<Json<MemberView>, ApiError>
where
  R: RosterSource,
  S: GuildStore + GuildDirectory,
{
  state
    .store
    .get_member_by_name(&name)
    .await
    .map_err(ApiError::from_store)?
    .map(|m| Json(MemberView::from(m)))
    .ok_or_else(|| ApiError::NotFound(format!("member {name}")))
}

/// `GET /members/{name}/professions`
pub async fn professions<R, S>(
  State(state): State<ApiState<R, S>>,
  Path(name): Path<String>,
) -> Result<Json<Vec<String>>, ApiError>
where
  R: RosterSource,
  S: GuildStore + GuildDirectory,
{
  let names = state
    .store
    .professions_for_member(&name)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(names))
}

/// `GET /owners/{owner}/members`
pub async fn owned<R, S>(
  State(state): State<ApiState<R, S>>,
  Path(owner): Path<String>,
) -> Result<Json<Vec<MemberView>>, ApiError>
where
  R: RosterSource,
  S: GuildStore + GuildDirectory,
{
  let members = state.store.list_owned(&owner).await.map_err(ApiError::from_store)?;
  Ok(views(members))
}

// ─── Claims ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ClaimBody {
  pub owner: String,
  #[serde(default)]
  pub main:  bool,
}

#[derive(Debug, Deserialize)]
pub struct OwnerBody {
  pub owner: String,
}

fn require_owner(owner: &str) -> Result<&str, ApiError> {
  let owner = owner.trim();
  if owner.is_empty() {
    return Err(ApiError::BadRequest("`owner` must not be empty".into()));
  }
  Ok(owner)
}

/// `POST /members/{name}/claim`. Body: `{"owner":"..","main":false}`
pub async fn claim<R, S>(
  State(state): State<ApiState<R, S>>,
  Path(name): Path<String>,
  Json(body): Json<ClaimBody>,
) -> Result<Json<MemberView>, ApiError>
where
  R: RosterSource,
  S: GuildStore + GuildDirectory,
{
  let owner = require_owner(&body.owner)?;
  let member = state
    .store
    .claim_member(&name, owner, body.main)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(member.into()))
}

/// `POST /members/{name}/unclaim`. Body: `{"owner":".."}`
pub async fn unclaim<R, S>(
  State(state): State<ApiState<R, S>>,
  Path(name): Path<String>,
  Json(body): Json<OwnerBody>,
) -> Result<Json<MemberView>, ApiError>
where
  R: RosterSource,
  S: GuildStore + GuildDirectory,
{
  let owner = require_owner(&body.owner)?;
  let member = state
    .store
    .unclaim_member(&name, owner)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(member.into()))
}

/// `POST /members/{name}/main`. Body: `{"owner":".."}`
pub async fn set_main<R, S>(
  State(state): State<ApiState<R, S>>,
  Path(name): Path<String>,
  Json(body): Json<OwnerBody>,
) -> Result<Json<MemberView>, ApiError>
where
  R: RosterSource,
  S: GuildStore + GuildDirectory,
{
  let owner = require_owner(&body.owner)?;
  let member = state.store.set_main(&name, owner).await.map_err(ApiError::from_store)?;
  Ok(Json(member.into()))
}
