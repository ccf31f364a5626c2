//! Game-data API client for the artisan guild roster mirror.
//!
//! [`BlizzardClient`] implements [`artisan_core::roster::RosterSource`] over
//! `reqwest`: client-credentials tokens cached until shortly before expiry,
//! a per-request timeout, and capped exponential backoff for rate limits and
//! transient upstream failures. Payloads are validated against the shapes in
//! [`wire`] and converted to core types at this boundary.

mod client;
mod retry;
mod wire;

pub mod error;

pub use client::{BlizzardClient, BlizzardConfig, slugify};
pub use error::{Error, Result};
pub use retry::BackoffPolicy;
