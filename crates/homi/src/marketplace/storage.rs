/// Error enumeration shared by the persistence traits.
///
/// `Conflict` doubles as the uniqueness signal: the store, not the
/// application-level pre-check, is the real enforcer of unique keys under
/// concurrent writes.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
