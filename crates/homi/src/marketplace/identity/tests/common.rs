use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::marketplace::audit::{AuditEntry, AuditRecorder, AuditStore};
use crate::marketplace::identity::domain::{
    Account, AccountId, ClientDraft, ProviderDraft, RegistrationDraft, SessionPrincipal,
};
use crate::marketplace::identity::password::{CredentialHashError, CredentialHasher};
use crate::marketplace::identity::repository::AccountRepository;
use crate::marketplace::identity::session::{SessionStore, SessionToken};
use crate::marketplace::identity::service::IdentityService;
use crate::marketplace::storage::RepositoryError;

pub(super) const GOOD_PASSWORD: &str = "Correcto#2024";

pub(super) fn client_draft(email: &str) -> RegistrationDraft {
    RegistrationDraft::Client(ClientDraft {
        name: "Marta".to_string(),
        first_surname: "Soto".to_string(),
        second_surname: None,
        email: email.to_string(),
        phone: None,
        password: GOOD_PASSWORD.to_string(),
        password_confirmation: GOOD_PASSWORD.to_string(),
    })
}

pub(super) fn provider_draft(email: &str) -> RegistrationDraft {
    RegistrationDraft::Provider(ProviderDraft {
        name: "Jorge".to_string(),
        first_surname: "Mendoza".to_string(),
        second_surname: "Luna".to_string(),
        email: email.to_string(),
        phone: "744-555-0101".to_string(),
        password: GOOD_PASSWORD.to_string(),
        password_confirmation: GOOD_PASSWORD.to_string(),
        agency_name: Some("Inmobiliaria Luna".to_string()),
        tax_id: None,
        postal_code: Some("39300".to_string()),
        social_links: Vec::new(),
    })
}

pub(super) fn build_service() -> (
    IdentityService<MemoryAccounts, PlainTextHasher>,
    Arc<MemoryAccounts>,
    Arc<MemoryAudit>,
) {
    let accounts = Arc::new(MemoryAccounts::default());
    let audit = Arc::new(MemoryAudit::default());
    let service = IdentityService::new(
        accounts.clone(),
        Arc::new(PlainTextHasher),
        AuditRecorder::new(audit.clone()),
    );
    (service, accounts, audit)
}

/// Reversible stand-in for the Argon2 hasher so the suite stays fast. The
/// real hasher has its own round-trip coverage.
pub(super) struct PlainTextHasher;

impl CredentialHasher for PlainTextHasher {
    fn hash(&self, plaintext: &str) -> Result<String, CredentialHashError> {
        Ok(format!("plain:{plaintext}"))
    }

    fn verify(&self, digest: &str, plaintext: &str) -> Result<bool, CredentialHashError> {
        Ok(digest == format!("plain:{plaintext}"))
    }
}

#[derive(Default)]
pub(super) struct MemoryAccounts {
    records: Mutex<HashMap<AccountId, Account>>,
}

impl AccountRepository for MemoryAccounts {
    fn insert(&self, account: Account) -> Result<Account, RepositoryError> {
        let mut guard = self.records.lock().expect("account mutex poisoned");
        if guard.values().any(|a| a.email == account.email) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(account.id.clone(), account.clone());
        Ok(account)
    }

    fn update(&self, account: Account) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("account mutex poisoned");
        if !guard.contains_key(&account.id) {
            return Err(RepositoryError::NotFound);
        }
        if guard
            .values()
            .any(|a| a.email == account.email && a.id != account.id)
        {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(account.id.clone(), account);
        Ok(())
    }

    fn fetch(&self, id: &AccountId) -> Result<Option<Account>, RepositoryError> {
        let guard = self.records.lock().expect("account mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn fetch_by_email(&self, email: &str) -> Result<Option<Account>, RepositoryError> {
        let guard = self.records.lock().expect("account mutex poisoned");
        Ok(guard.values().find(|a| a.email == email).cloned())
    }
}

/// Simulates an insert racing past the friendly duplicate lookup: the
/// lookup sees nothing, the unique constraint still fires.
pub(super) struct RacyAccounts;

impl AccountRepository for RacyAccounts {
    fn insert(&self, _account: Account) -> Result<Account, RepositoryError> {
        Err(RepositoryError::Conflict)
    }

    fn update(&self, _account: Account) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("read only".to_string()))
    }

    fn fetch(&self, _id: &AccountId) -> Result<Option<Account>, RepositoryError> {
        Ok(None)
    }

    fn fetch_by_email(&self, _email: &str) -> Result<Option<Account>, RepositoryError> {
        Ok(None)
    }
}

#[derive(Default)]
pub(super) struct MemoryAudit {
    entries: Mutex<Vec<AuditEntry>>,
}

impl MemoryAudit {
    pub(super) fn actions(&self) -> Vec<String> {
        self.entries
            .lock()
            .expect("audit mutex poisoned")
            .iter()
            .map(|e| e.action.clone())
            .collect()
    }

    pub(super) fn details(&self) -> Vec<String> {
        self.entries
            .lock()
            .expect("audit mutex poisoned")
            .iter()
            .map(|e| e.detail.clone())
            .collect()
    }
}

impl AuditStore for MemoryAudit {
    fn append(&self, entry: AuditEntry) -> Result<(), RepositoryError> {
        self.entries
            .lock()
            .expect("audit mutex poisoned")
            .push(entry);
        Ok(())
    }

    fn entries(&self) -> Result<Vec<AuditEntry>, RepositoryError> {
        let mut entries = self
            .entries
            .lock()
            .expect("audit mutex poisoned")
            .clone();
        entries.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
        Ok(entries)
    }
}

#[derive(Default)]
pub(super) struct MemorySessions {
    counter: AtomicU64,
    sessions: Mutex<HashMap<SessionToken, SessionPrincipal>>,
}

impl SessionStore for MemorySessions {
    fn create(&self, principal: SessionPrincipal) -> SessionToken {
        let token = SessionToken(format!(
            "session-{}",
            self.counter.fetch_add(1, Ordering::Relaxed)
        ));
        self.sessions
            .lock()
            .expect("session mutex poisoned")
            .insert(token.clone(), principal);
        token
    }

    fn get(&self, token: &SessionToken) -> Option<SessionPrincipal> {
        self.sessions
            .lock()
            .expect("session mutex poisoned")
            .get(token)
            .cloned()
    }

    fn refresh(&self, token: &SessionToken, principal: SessionPrincipal) {
        self.sessions
            .lock()
            .expect("session mutex poisoned")
            .insert(token.clone(), principal);
    }

    fn destroy(&self, token: &SessionToken) {
        self.sessions
            .lock()
            .expect("session mutex poisoned")
            .remove(token);
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
