use super::domain::{Account, AccountId};
use crate::marketplace::storage::RepositoryError;

/// Storage abstraction for accounts.
///
/// `insert` must reject a duplicate email with [`RepositoryError::Conflict`]
/// even when two requests race past the service-level pre-check; the store's
/// unique constraint is the actual invariant enforcer.
pub trait AccountRepository: Send + Sync {
    fn insert(&self, account: Account) -> Result<Account, RepositoryError>;
    fn update(&self, account: Account) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &AccountId) -> Result<Option<Account>, RepositoryError>;
    /// Lookup by the stored (lowercased) email.
    fn fetch_by_email(&self, email: &str) -> Result<Option<Account>, RepositoryError>;
}
