//! Handlers for browsing the static profession and recipe catalog.

use axum::{
  Json,
  extract::{Path, Query, State},
};
use serde::Deserialize;

use artisan_core::{
  catalog::{Profession, Recipe, RecipeId},
  roster::RosterSource,
  store::{GuildDirectory, GuildStore},
};

use crate::{ApiState, error::ApiError};

const DEFAULT_PAGE: usize = 25;
const MAX_PAGE: usize = 100;

/// `GET /professions`
pub async fn professions<R, S>(
  State(state): State<ApiState<R, S>>,
) -> Result<Json<Vec<Profession>>, ApiError>
where
  R: RosterSource,
  S: GuildStore + GuildDirectory,
{
  let professions = state.store.list_professions().await.map_err(ApiError::from_store)?;
  Ok(Json(professions))
}

#[derive(Debug, Deserialize)]
pub struct PageParams {
  pub limit:  Option<usize>,
  #[serde(default)]
  pub offset: usize,
}

/// `GET /recipes[?limit=<n>&offset=<n>]`, at most 100 per page.
pub async fn recipes<R, S>(
  State(state): State<ApiState<R, S>>,
  Query(page): Query<PageParams>,
) -> Result<Json<Vec<Recipe>>, ApiError>
where
  R: RosterSource,
  S: GuildStore + GuildDirectory,
{
  let limit = page.limit.unwrap_or(DEFAULT_PAGE).min(MAX_PAGE);
  let recipes = state
    .store
    .list_recipes(limit, page.offset)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(recipes))
}

/// `GET /recipes/{id}`
pub async fn recipe<R, S>(
  State(state): State<ApiState<R, S>>,
  Path(id): Path<RecipeId>,
) -> Result<Json<Recipe>, ApiError>
where
  R: RosterSource,
  S: GuildStore + GuildDirectory,
{
  state
    .store
    .get_recipe(id)
    .await
    .map_err(ApiError::from_store)?
    .map(Json)
    .ok_or_else(|| ApiError::NotFound(format!("recipe {id}")))
}
