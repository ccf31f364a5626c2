//! Error type for `artisan-blizzard`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("client id and secret must both be configured")]
  MissingCredentials,

  #[error("http status {status} for {url}")]
  Status { status: u16, url: String },

  #[error("request failed: {0}")]
  Http(#[from] reqwest::Error),

  #[error("unexpected payload from {url}: {source}")]
  Decode {
    url:    String,
    #[source]
    source: serde_json::Error,
  },
}

impl Error {
  /// The upstream status code, if the failure was an HTTP status.
  pub fn status(&self) -> Option<u16> {
    match self {
      Self::Status { status, .. } => Some(*status),
      Self::Http(err) => err.status().map(|s| s.as_u16()),
      _ => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
