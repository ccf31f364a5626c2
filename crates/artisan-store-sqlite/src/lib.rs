//! SQLite backend for the artisan guild store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every operation is a single `call` on
//! that thread, so concurrent member syncs interleave at statement-batch
//! granularity and never need an external lock.

mod directory;
mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
