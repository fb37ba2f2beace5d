//! Marketplace core: account identity, listing lifecycle, and the audit
//! trail.
//!
//! Each subsystem follows the same shape: a `domain` module with the record
//! types, a `repository` trait that leaves persistence to the caller (the
//! backing store is the only synchronization point), a service that owns
//! the business rules, and an axum router exposing them.

pub mod audit;
pub mod identity;
pub mod listings;
pub mod storage;
pub mod validation;
