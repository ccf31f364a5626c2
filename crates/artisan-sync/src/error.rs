//! Error types for `artisan-sync`.

use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failures that abort a whole run. Everything else is absorbed into the
/// [`SyncReport`](artisan_core::report::SyncReport) counters.
#[derive(Debug, Error)]
pub enum SyncError {
  /// Another sync holds the re-entrancy guard. Nothing was fetched.
  #[error("a roster sync is already in progress")]
  AlreadyRunning,

  #[error("failed to obtain an access token: {0}")]
  Token(#[source] BoxError),

  /// The roster fetch failed or came back empty; no writes were made.
  #[error("failed to fetch the guild roster: {0}")]
  Roster(#[source] BoxError),

  #[error("failed to fetch catalog data: {0}")]
  Catalog(#[source] BoxError),

  #[error("store error: {0}")]
  Store(#[source] BoxError),
}

/// Why one character could not be synced. Logged and counted, never
/// returned from a run.
#[derive(Debug, Error)]
pub enum MemberSyncError {
  #[error("summary fetch failed: {0}")]
  Summary(#[source] BoxError),

  #[error("professions fetch failed: {0}")]
  Professions(#[source] BoxError),

  #[error("character not found upstream")]
  NotFound,

  #[error("store write failed: {0}")]
  Store(#[source] BoxError),
}

pub type Result<T, E = SyncError> = std::result::Result<T, E>;

pub(crate) fn boxed<E: std::error::Error + Send + Sync + 'static>(err: E) -> BoxError {
  Box::new(err)
}
