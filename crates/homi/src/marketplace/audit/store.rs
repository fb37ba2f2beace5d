use super::domain::AuditEntry;
use crate::marketplace::storage::RepositoryError;

/// Append-only storage for audit entries. Entries are never mutated or
/// deleted; `entries` returns them newest first.
pub trait AuditStore: Send + Sync {
    fn append(&self, entry: AuditEntry) -> Result<(), RepositoryError>;
    fn entries(&self) -> Result<Vec<AuditEntry>, RepositoryError>;
}
