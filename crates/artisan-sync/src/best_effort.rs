//! Logging wrapper for steps whose failure must not abort the caller.

use std::{fmt::Display, future::Future};

use tracing::debug;

/// Await `fut`, logging a failure at debug level instead of propagating it.
///
/// Used for crafted-item write-backs and presentation side effects.
pub async fn best_effort<T, E, F>(what: &str, fut: F) -> Option<T>
where
  E: Display,
  F: Future<Output = Result<T, E>>,
{
  match fut.await {
    Ok(value) => Some(value),
    Err(err) => {
      debug!(what, error = %err, "best-effort step failed");
      None
    }
  }
}
