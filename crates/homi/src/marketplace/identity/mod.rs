//! Account identity: registration, authentication, provider upgrades, and
//! profile maintenance.

pub mod domain;
pub mod password;
pub mod repository;
pub mod router;
pub mod service;
pub mod session;

#[cfg(test)]
mod tests;

pub use domain::{
    Account, AccountId, AccountRole, AccountStatus, AccountView, ClientDraft, ProfileUpdate,
    ProviderDetails, ProviderDraft, ProviderUpgrade, RegistrationDraft, SessionPrincipal,
};
pub use password::{Argon2CredentialHasher, CredentialHashError, CredentialHasher, PasswordWeakness};
pub use repository::AccountRepository;
pub use router::{identity_router, IdentityState};
pub use service::{IdentityError, IdentityService, UpgradeOutcome};
pub use session::{
    principal_from_headers, token_from_headers, SessionStore, SessionToken, SESSION_HEADER,
};
