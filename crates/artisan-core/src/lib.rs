//! Core types and trait definitions for the artisan guild roster mirror.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! The storage backend, the game-data client, and the sync engine all depend
//! on it; it depends on nothing proprietary.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod catalog;
pub mod error;
pub mod member;
pub mod report;
pub mod role;
pub mod roster;
pub mod store;

pub use error::{Error, Result};
