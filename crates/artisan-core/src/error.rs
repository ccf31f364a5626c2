//! Error types for `artisan-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("member not found: {0}")]
  MemberNotFound(String),

  #[error("member {0} is already claimed by another owner")]
  AlreadyClaimed(String),

  #[error("member {0} is not claimed by this owner")]
  NotOwner(String),

  #[error("unknown main role: {0:?}")]
  UnknownRole(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
