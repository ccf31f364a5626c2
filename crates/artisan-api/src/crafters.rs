//! `GET /crafters`: who can craft something.

use axum::{
  Json,
  extract::{Query, State},
};
use serde::Deserialize;

use artisan_core::{
  catalog::Crafter,
  roster::RosterSource,
  store::{GuildDirectory, GuildStore},
};

use crate::{ApiState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct SearchParams {
  /// Partial, case-insensitive recipe name.
  pub recipe: Option<String>,
  /// Produced item id.
  pub item:   Option<i64>,
}

/// `GET /crafters?recipe=<fragment>` or `GET /crafters?item=<id>`
pub async fn search<R, S>(
  State(state): State<ApiState<R, S>>,
  Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Crafter>>, ApiError>
where
  R: RosterSource,
  S: GuildStore + GuildDirectory,
{
  let recipe = params.recipe.as_deref().map(str::trim).filter(|s| !s.is_empty());

  let crafters = match (recipe, params.item) {
    (Some(fragment), _) => state.store.search_by_recipe_name(fragment).await,
    (None, Some(item)) => state.store.search_by_item_id(item).await,
    (None, None) => {
      return Err(ApiError::BadRequest("one of `recipe` or `item` is required".into()));
    }
  }
  .map_err(ApiError::from_store)?;

  Ok(Json(crafters))
}
