//! Aggregate counters returned by a roster sync.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What one full-roster sync did.
///
/// Partial success is conveyed through the counters: `members_processed`
/// out of `members_total`, with the remainder in `members_failed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
  pub started_at:                 DateTime<Utc>,
  pub finished_at:                DateTime<Utc>,
  /// Characters in the fetched roster.
  pub members_total:              usize,
  pub members_processed:          usize,
  pub members_failed:             usize,
  pub members_added:              usize,
  pub members_updated:            usize,
  pub recipes_added:              usize,
  pub recipes_removed:            usize,
  pub members_departed:           usize,
  /// Knowledge rows deleted along with departed members.
  pub departed_knowledge_removed: usize,
  pub orphans_swept:              usize,
}

impl SyncReport {
  /// `true` when the run added or removed nothing.
  pub fn is_noop(&self) -> bool {
    self.members_added == 0
      && self.recipes_added == 0
      && self.recipes_removed == 0
      && self.members_departed == 0
      && self.orphans_swept == 0
  }
}
