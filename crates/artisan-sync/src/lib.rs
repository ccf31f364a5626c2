//! The roster synchronization engine.
//!
//! [`SyncEngine`] brings a [`GuildStore`](artisan_core::store::GuildStore)
//! in line with a fresh roster snapshot from a
//! [`RosterSource`](artisan_core::roster::RosterSource): members are processed
//! in bounded concurrent batches, a single character's failure never aborts
//! the run, and departed members and orphaned knowledge are cleaned up at the
//! end. [`CatalogBootstrap`] populates the profession and recipe catalogs the
//! first time they are empty.

mod best_effort;
mod catalog;
mod engine;

pub mod error;

pub use best_effort::best_effort;
pub use catalog::{BootstrapReport, CatalogBootstrap};
pub use engine::{SyncConfig, SyncEngine};
pub use error::{MemberSyncError, Result, SyncError};
