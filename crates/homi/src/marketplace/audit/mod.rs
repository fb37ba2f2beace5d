//! Append-only audit trail for privileged account and listing transitions.
//!
//! Writes are fire-and-forget: a failed append must never abort the
//! business operation that triggered it.

pub mod domain;
pub mod recorder;
pub mod router;
pub mod store;

pub use domain::{AuditEntry, AuditEntryView};
pub use recorder::{AuditRecorder, AuditTrail};
pub use router::{audit_router, AuditState};
pub use store::AuditStore;
