use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use homi::marketplace::audit::{AuditEntry, AuditStore};
use homi::marketplace::identity::{
    Account, AccountId, AccountRepository, SessionPrincipal, SessionStore, SessionToken,
};
use homi::marketplace::listings::{
    Listing, ListingFilter, ListingId, ListingRepository, MediaStorage, MediaStorageError,
};
use homi::marketplace::storage::RepositoryError;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Process-local account store with the unique-email constraint the
/// identity service leans on.
#[derive(Default, Clone)]
pub(crate) struct InMemoryAccountRepository {
    records: Arc<Mutex<HashMap<AccountId, Account>>>,
}

impl AccountRepository for InMemoryAccountRepository {
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

#[derive(Default, Clone)]
pub(crate) struct InMemoryListingRepository {
    records: Arc<Mutex<HashMap<ListingId, Listing>>>,
}

impl ListingRepository for InMemoryListingRepository {
    fn insert(&self, listing: Listing) -> Result<Listing, RepositoryError> {
        let mut guard = self.records.lock().expect("listing mutex poisoned");
        if guard.contains_key(&listing.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(listing.id.clone(), listing.clone());
        Ok(listing)
    }

    fn update(&self, listing: Listing) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("listing mutex poisoned");
        if !guard.contains_key(&listing.id) {
            return Err(RepositoryError::NotFound);
        }
        guard.insert(listing.id.clone(), listing);
        Ok(())
    }

    fn fetch(&self, id: &ListingId) -> Result<Option<Listing>, RepositoryError> {
        let guard = self.records.lock().expect("listing mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn find(
        &self,
        filter: &ListingFilter,
        limit: Option<usize>,
    ) -> Result<Vec<Listing>, RepositoryError> {
        let guard = self.records.lock().expect("listing mutex poisoned");
        let mut matches: Vec<Listing> = guard
            .values()
            .filter(|listing| filter.matches(listing))
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        if let Some(limit) = limit {
            matches.truncate(limit);
        }
        Ok(matches)
    }

    fn distinct_neighborhoods(&self, city: &str) -> Result<Vec<String>, RepositoryError> {
        let guard = self.records.lock().expect("listing mutex poisoned");
        let mut neighborhoods: Vec<String> = guard
            .values()
            .filter(|listing| listing.address.city.eq_ignore_ascii_case(city))
            .map(|listing| listing.address.neighborhood.trim().to_string())
            .filter(|neighborhood| !neighborhood.is_empty())
            .collect();
        neighborhoods.sort();
        neighborhoods.dedup();
        Ok(neighborhoods)
    }
}

#[derive(Default)]
pub(crate) struct InMemoryAuditStore {
    entries: Mutex<Vec<AuditEntry>>,
}

impl AuditStore for InMemoryAuditStore {
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
pub(crate) struct InMemorySessionStore {
    counter: AtomicU64,
    sessions: Mutex<HashMap<SessionToken, SessionPrincipal>>,
}

impl SessionStore for InMemorySessionStore {
    fn create(&self, principal: SessionPrincipal) -> SessionToken {
        let token = SessionToken(format!(
            "session-{:08}",
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

/// Media sink for the demo command, so a walkthrough leaves no files
/// behind.
#[derive(Default)]
pub(crate) struct InMemoryMediaStorage {
    stored: Mutex<Vec<String>>,
}

impl MediaStorage for InMemoryMediaStorage {
    fn store(&self, _bytes: &[u8], suggested_name: &str) -> Result<String, MediaStorageError> {
        let mut guard = self.stored.lock().expect("media mutex poisoned");
        if guard.iter().any(|name| name == suggested_name) {
            return Err(MediaStorageError::Unavailable(format!(
                "name collision: {suggested_name}"
            )));
        }
        guard.push(suggested_name.to_string());
        Ok(format!("/media/{suggested_name}"))
    }
}
