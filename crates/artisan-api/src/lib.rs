//! JSON API over the guild roster mirror.
//!
//! Exposes an axum [`Router`] backed by any store implementing both
//! [`GuildStore`] and [`GuildDirectory`], plus the [`SyncEngine`] that writes
//! to it. Chat-platform wiring, auth and TLS are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", artisan_api::api_router(ApiState::new(store, engine)))
//! ```

pub mod catalog;
pub mod crafters;
pub mod error;
pub mod members;
pub mod sync;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use artisan_core::{
  roster::RosterSource,
  store::{GuildDirectory, GuildStore},
};
use artisan_sync::SyncEngine;

pub use error::ApiError;

/// Shared handler state.
pub struct ApiState<R, S> {
  pub store:  Arc<S>,
  pub engine: Arc<SyncEngine<R, S>>,
}

impl<R, S> ApiState<R, S> {
  pub fn new(store: Arc<S>, engine: Arc<SyncEngine<R, S>>) -> Self { Self { store, engine } }
}

impl<R, S> Clone for ApiState<R, S> {
  fn clone(&self) -> Self {
    Self { store: self.store.clone(), engine: self.engine.clone() }
  }
}

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<R, S>(state: ApiState<R, S>) -> Router<()>
where
  R: RosterSource + 'static,
  S: GuildStore + GuildDirectory + 'static,
{
  Router::new()
    // Knowledge search
    .route("/crafters", get(crafters::search::<R, S>))
    // Members
    .route("/members", get(members::list::<R, S>))
    .route("/members/claimed", get(members::claimed::<R, S>))
    .route("/members/unclaimed", get(members::unclaimed::<R, S>))
    .route("/members/unclaimed/names", get(members::unclaimed_names::<R, S>))
    .route("/members/{name}", get(members::get_one::<R, S>))
    .route("/members/{name}/professions", get(members::professions::<R, S>))
    .route("/members/{name}/claim", post(members::claim::<R, S>))
    .route("/members/{name}/unclaim", post(members::unclaim::<R, S>))
    .route("/members/{name}/main", post(members::set_main::<R, S>))
    .route("/owners/{owner}/members", get(members::owned::<R, S>))
    // Catalog
    .route("/professions", get(catalog::professions::<R, S>))
    .route("/recipes", get(catalog::recipes::<R, S>))
    .route("/recipes/{id}", get(catalog::recipe::<R, S>))
    // Sync
    .route("/sync", get(sync::status::<R, S>).post(sync::run::<R, S>))
    .with_state(state)
}

#[cfg(test)]
mod tests;
