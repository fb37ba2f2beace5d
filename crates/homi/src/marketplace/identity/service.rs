use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::debug;

use super::domain::{
    Account, AccountId, AccountRole, AccountStatus, ProfileUpdate, ProviderDetails,
    ProviderUpgrade, RegistrationDraft, SessionPrincipal,
};
use super::password::{check_strength, CredentialHashError, CredentialHasher, PasswordWeakness};
use super::repository::AccountRepository;
use crate::marketplace::audit::AuditRecorder;
use crate::marketplace::storage::RepositoryError;
use crate::marketplace::validation::{require_text, FieldError};

/// Service owning the account business rules: registration, authentication,
/// provider upgrades, and profile maintenance.
pub struct IdentityService<R, H> {
    accounts: Arc<R>,
    hasher: Arc<H>,
    audit: AuditRecorder,
}

static ACCOUNT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_account_id() -> AccountId {
    let id = ACCOUNT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    AccountId(format!("acct-{id:06}"))
}

/// Result of a provider upgrade attempt. A second upgrade on the same
/// account is an informational no-op, never an error.
#[derive(Debug, Clone)]
pub enum UpgradeOutcome {
    Upgraded {
        account: Account,
        principal: SessionPrincipal,
    },
    AlreadyProvider {
        account: Account,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("required fields are missing or malformed")]
    Validation(Vec<FieldError>),
    #[error("the email address is already registered")]
    DuplicateEmail,
    #[error("the password does not meet the strength policy")]
    WeakPassword(Vec<PasswordWeakness>),
    /// Uniform rejection: never reveals whether the email existed.
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("the current password is incorrect")]
    WrongPassword,
    #[error("account not found")]
    NotFound,
    #[error(transparent)]
    Storage(#[from] RepositoryError),
    #[error(transparent)]
    Hash(#[from] CredentialHashError),
}

struct ValidatedDraft {
    name: String,
    first_surname: String,
    second_surname: Option<String>,
    email: String,
    phone: Option<String>,
    password: String,
    role: AccountRole,
    provider: Option<ProviderDetails>,
}

impl<R, H> IdentityService<R, H>
where
    R: AccountRepository + 'static,
    H: CredentialHasher + 'static,
{
    pub fn new(accounts: Arc<R>, hasher: Arc<H>, audit: AuditRecorder) -> Self {
        Self {
            accounts,
            hasher,
            audit,
        }
    }

    /// Register a new account from a role-tagged draft.
    ///
    /// Field validation runs first and collects every failure; the password
    /// strength policy applies afterwards. The duplicate-email lookup is
    /// only a friendly fast path; a racing insert still surfaces
    /// `DuplicateEmail` through the store's conflict signal.
    pub fn register(&self, draft: RegistrationDraft) -> Result<Account, IdentityError> {
        let validated = validate_draft(&draft)?;

        if self
            .accounts
            .fetch_by_email(&validated.email)?
            .is_some()
        {
            return Err(IdentityError::DuplicateEmail);
        }

        let password_hash = self.hasher.hash(&validated.password)?;
        let account = Account {
            id: next_account_id(),
            name: validated.name,
            first_surname: validated.first_surname,
            second_surname: validated.second_surname,
            email: validated.email,
            password_hash,
            phone: validated.phone,
            role: validated.role,
            status: AccountStatus::Active,
            provider: validated.provider,
            created_at: chrono::Utc::now(),
        };

        let stored = match self.accounts.insert(account) {
            Ok(stored) => stored,
            Err(RepositoryError::Conflict) => return Err(IdentityError::DuplicateEmail),
            Err(other) => return Err(other.into()),
        };

        self.audit.record(
            Some(stored.id.clone()),
            "account.registered",
            format!("{} registered as {}", stored.email, stored.role.label()),
        );
        debug!(account = %stored.id.0, role = stored.role.label(), "account registered");
        Ok(stored)
    }

    /// Verify credentials and return a session principal.
    ///
    /// Pure request/response with no side effects, so an external rate
    /// limiter can wrap it unchanged. Unknown email, wrong password, and
    /// suspended accounts all yield the same `InvalidCredentials`.
    pub fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SessionPrincipal, IdentityError> {
        let email = normalize_email(email);
        let account = self
            .accounts
            .fetch_by_email(&email)?
            .ok_or(IdentityError::InvalidCredentials)?;

        if !self.hasher.verify(&account.password_hash, password)? {
            return Err(IdentityError::InvalidCredentials);
        }
        if account.status != AccountStatus::Active {
            return Err(IdentityError::InvalidCredentials);
        }

        Ok(account.principal())
    }

    /// Upgrade a client account to provider.
    ///
    /// Always requires the current password as credential proof, and always
    /// hands back a refreshed principal so the caller's session can be
    /// updated in the same request. Idempotent: provider and admin accounts
    /// come back unchanged as `AlreadyProvider`.
    pub fn upgrade_to_provider(
        &self,
        id: &AccountId,
        upgrade: ProviderUpgrade,
    ) -> Result<UpgradeOutcome, IdentityError> {
        let mut account = self.accounts.fetch(id)?.ok_or(IdentityError::NotFound)?;

        if !self
            .hasher
            .verify(&account.password_hash, &upgrade.current_password)?
        {
            return Err(IdentityError::WrongPassword);
        }

        if account.role.can_publish() {
            return Ok(UpgradeOutcome::AlreadyProvider { account });
        }

        if let Some(second_surname) = non_blank(upgrade.second_surname) {
            account.second_surname = Some(second_surname);
        }
        if let Some(phone) = non_blank(upgrade.phone) {
            account.phone = Some(phone);
        }

        let mut errors = Vec::new();
        if account.second_surname.is_none() {
            errors.push(FieldError::required("second_surname"));
        }
        if account.phone.is_none() {
            errors.push(FieldError::required("phone"));
        }
        if !errors.is_empty() {
            return Err(IdentityError::Validation(errors));
        }

        account.role = AccountRole::Provider;
        account.provider = Some(ProviderDetails {
            agency_name: non_blank(upgrade.agency_name),
            tax_id: non_blank(upgrade.tax_id),
            postal_code: non_blank(upgrade.postal_code),
            social_links: upgrade.social_links,
            verified: false,
        });

        self.accounts.update(account.clone())?;
        self.audit.record(
            Some(account.id.clone()),
            "account.upgraded_to_provider",
            format!("{} is now a provider", account.email),
        );

        let principal = account.principal();
        Ok(UpgradeOutcome::Upgraded { account, principal })
    }

    /// Apply a profile edit after verifying the current password.
    pub fn update_profile(
        &self,
        id: &AccountId,
        update: ProfileUpdate,
    ) -> Result<Account, IdentityError> {
        let mut account = self.accounts.fetch(id)?.ok_or(IdentityError::NotFound)?;

        if !self
            .hasher
            .verify(&account.password_hash, &update.current_password)?
        {
            return Err(IdentityError::WrongPassword);
        }

        let mut changed = Vec::new();

        if let Some(email) = non_blank(update.email) {
            let email = normalize_email(&email);
            if !email.contains('@') {
                return Err(IdentityError::Validation(vec![FieldError::new(
                    "email",
                    "must be a valid email address",
                )]));
            }
            if email != account.email {
                if let Some(existing) = self.accounts.fetch_by_email(&email)? {
                    if existing.id != account.id {
                        return Err(IdentityError::DuplicateEmail);
                    }
                }
                account.email = email;
                changed.push("email");
            }
        }

        if let Some(phone) = non_blank(update.phone) {
            account.phone = Some(phone);
            changed.push("phone");
        }

        if let Some(new_password) = update.new_password.filter(|p| !p.is_empty()) {
            check_strength(&new_password).map_err(IdentityError::WeakPassword)?;
            if update.password_confirmation.as_deref() != Some(new_password.as_str()) {
                return Err(IdentityError::Validation(vec![FieldError::new(
                    "password_confirmation",
                    "does not match the new password",
                )]));
            }
            account.password_hash = self.hasher.hash(&new_password)?;
            changed.push("password");
        }

        if changed.is_empty() {
            return Ok(account);
        }

        match self.accounts.update(account.clone()) {
            Ok(()) => {}
            // The store's unique email constraint caught a racing change.
            Err(RepositoryError::Conflict) => return Err(IdentityError::DuplicateEmail),
            Err(other) => return Err(other.into()),
        }

        self.audit.record(
            Some(account.id.clone()),
            "account.profile_updated",
            format!("changed: {}", changed.join(", ")),
        );
        Ok(account)
    }

    /// Suspend an account (admin surface). Authentication rejects suspended
    /// accounts with the uniform credentials error.
    pub fn suspend(
        &self,
        actor: &SessionPrincipal,
        id: &AccountId,
    ) -> Result<Account, IdentityError> {
        let mut account = self.accounts.fetch(id)?.ok_or(IdentityError::NotFound)?;
        account.status = AccountStatus::Suspended;
        self.accounts.update(account.clone())?;
        self.audit.record(
            Some(actor.account_id.clone()),
            "account.suspended",
            format!("suspended {}", account.email),
        );
        Ok(account)
    }

    /// Fetch an account for display.
    pub fn get(&self, id: &AccountId) -> Result<Account, IdentityError> {
        self.accounts.fetch(id)?.ok_or(IdentityError::NotFound)
    }
}

fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate_draft(draft: &RegistrationDraft) -> Result<ValidatedDraft, IdentityError> {
    let mut errors = Vec::new();

    let (validated, password, confirmation) = match draft {
        RegistrationDraft::Client(client) => {
            let name = require_text(&mut errors, "name", &client.name);
            let first_surname = require_text(&mut errors, "first_surname", &client.first_surname);
            let email = require_text(&mut errors, "email", &client.email);
            let draft = ValidatedDraft {
                name: name.unwrap_or_default(),
                first_surname: first_surname.unwrap_or_default(),
                second_surname: non_blank(client.second_surname.clone()),
                email: email.map(|e| normalize_email(&e)).unwrap_or_default(),
                phone: non_blank(client.phone.clone()),
                password: client.password.clone(),
                role: AccountRole::Client,
                provider: None,
            };
            (draft, &client.password, &client.password_confirmation)
        }
        RegistrationDraft::Provider(provider) => {
            let name = require_text(&mut errors, "name", &provider.name);
            let first_surname =
                require_text(&mut errors, "first_surname", &provider.first_surname);
            let second_surname =
                require_text(&mut errors, "second_surname", &provider.second_surname);
            let email = require_text(&mut errors, "email", &provider.email);
            let phone = require_text(&mut errors, "phone", &provider.phone);
            let draft = ValidatedDraft {
                name: name.unwrap_or_default(),
                first_surname: first_surname.unwrap_or_default(),
                second_surname,
                email: email.map(|e| normalize_email(&e)).unwrap_or_default(),
                phone,
                password: provider.password.clone(),
                role: AccountRole::Provider,
                provider: Some(ProviderDetails {
                    agency_name: non_blank(provider.agency_name.clone()),
                    tax_id: non_blank(provider.tax_id.clone()),
                    postal_code: non_blank(provider.postal_code.clone()),
                    social_links: provider.social_links.clone(),
                    verified: false,
                }),
            };
            (draft, &provider.password, &provider.password_confirmation)
        }
    };

    if password.is_empty() {
        errors.push(FieldError::required("password"));
    }
    if !validated.email.is_empty() && !validated.email.contains('@') {
        errors.push(FieldError::new("email", "must be a valid email address"));
    }
    if !password.is_empty() && password != confirmation {
        errors.push(FieldError::new(
            "password_confirmation",
            "does not match the password",
        ));
    }

    if !errors.is_empty() {
        return Err(IdentityError::Validation(errors));
    }

    check_strength(password).map_err(IdentityError::WeakPassword)?;

    Ok(validated)
}
