//! Core library for the Homi real-estate marketplace.
//!
//! The `marketplace` module holds the domain: account identity, provider
//! listing submission and moderation, the approved-only search engine, and
//! the append-only audit trail. `config`, `telemetry`, and `error` carry the
//! service plumbing shared with the API binary.

pub mod config;
pub mod error;
pub mod marketplace;
pub mod telemetry;
