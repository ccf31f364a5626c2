//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use artisan_sync::SyncError;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("conflict: {0}")]
  Conflict(String),

  /// The game-data API failed before a sync could start.
  #[error("upstream error: {0}")]
  Upstream(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Wrap a store error, surfacing domain rejections (unknown member, claim
  /// conflicts) found anywhere in its source chain as 404 / 409.
  pub fn from_store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    let mut cause: Option<&(dyn std::error::Error + 'static)> = Some(&err);
    while let Some(e) = cause {
      if let Some(core) = e.downcast_ref::<artisan_core::Error>() {
        match core {
          artisan_core::Error::MemberNotFound(_) => return Self::NotFound(core.to_string()),
          artisan_core::Error::AlreadyClaimed(_) | artisan_core::Error::NotOwner(_) => {
            return Self::Conflict(core.to_string());
          }
          artisan_core::Error::UnknownRole(_) => return Self::BadRequest(core.to_string()),
        }
      }
      cause = e.source();
    }
    Self::Store(Box::new(err))
  }
}

impl From<SyncError> for ApiError {
  fn from(err: SyncError) -> Self {
    match err {
      SyncError::AlreadyRunning => Self::Conflict(err.to_string()),
      SyncError::Token(_) | SyncError::Roster(_) | SyncError::Catalog(_) => {
        Self::Upstream(err.to_string())
      }
      SyncError::Store(e) => Self::Store(e),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Upstream(m) => (StatusCode::BAD_GATEWAY, m.clone()),
      ApiError::Store(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
