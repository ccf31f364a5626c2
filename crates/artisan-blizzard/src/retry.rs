//! Retry classification and backoff for upstream requests.

use std::time::Duration;

use reqwest::StatusCode;

/// Capped exponential backoff: `base_delay * 2^attempt`, at most `max_delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
  /// Retries after the first attempt; `0` disables retrying.
  pub max_retries: usize,
  pub base_delay:  Duration,
  pub max_delay:   Duration,
}

impl Default for BackoffPolicy {
  fn default() -> Self {
    Self {
      max_retries: 3,
      base_delay:  Duration::from_millis(250),
      max_delay:   Duration::from_secs(5),
    }
  }
}

impl BackoffPolicy {
  pub fn delay_for_attempt(&self, attempt: usize) -> Duration {
    let factor = u32::try_from(attempt)
      .ok()
      .and_then(|a| 1u32.checked_shl(a))
      .unwrap_or(u32::MAX);
    self.base_delay.saturating_mul(factor).min(self.max_delay)
  }
}

/// Rate limiting and server-side failures are worth another attempt.
pub fn is_retryable_status(status: StatusCode) -> bool {
  status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

pub fn is_retryable_error(err: &reqwest::Error) -> bool {
  err.is_timeout() || err.is_connect()
}
