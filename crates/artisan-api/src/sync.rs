//! Handlers for triggering and observing roster syncs.

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::info;

use artisan_core::{
  report::SyncReport,
  roster::RosterSource,
  store::{GuildDirectory, GuildStore},
};

use crate::{ApiState, error::ApiError};

#[derive(Debug, Serialize)]
pub struct SyncStatus {
  pub in_progress: bool,
}

/// `GET /sync`
pub async fn status<R, S>(State(state): State<ApiState<R, S>>) -> Json<SyncStatus>
where
  R: RosterSource,
  S: GuildStore + GuildDirectory,
{
  Json(SyncStatus { in_progress: state.engine.is_sync_in_progress() })
}

/// `POST /sync`
///
/// Runs a full roster sync to completion and returns its report. Answers
/// 409 if another sync holds the guard.
pub async fn run<R, S>(State(state): State<ApiState<R, S>>) -> Result<Json<SyncReport>, ApiError>
where
  R: RosterSource,
  S: GuildStore + GuildDirectory,
{
  let report = state.engine.sync_roster().await?;
  info!(
    processed = report.members_processed,
    failed = report.members_failed,
    "sync triggered over http finished"
  );
  Ok(Json(report))
}
