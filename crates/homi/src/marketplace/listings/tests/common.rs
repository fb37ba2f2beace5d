use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{Duration, Utc};
use serde_json::Value;

use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::MarketConfig;
use crate::marketplace::identity::session::{SessionStore, SessionToken};
use crate::marketplace::audit::{AuditEntry, AuditRecorder, AuditStore};
use crate::marketplace::identity::{AccountId, AccountRole, SessionPrincipal};
use crate::marketplace::listings::domain::{
    Address, Coordinates, Listing, ListingId, ListingImage, ModerationStatus, OperationKind,
    PropertyCategory,
};
use crate::marketplace::listings::repository::{ListingFilter, ListingRepository};
use crate::marketplace::listings::search::SearchEngine;
use crate::marketplace::listings::storage::{MediaStorage, MediaStorageError};
use crate::marketplace::listings::submission::{ListingDesk, ListingDraft, MediaUpload};
use crate::marketplace::storage::RepositoryError;

pub(super) fn market_config() -> MarketConfig {
    MarketConfig {
        city: "Acapulco".to_string(),
        front_page_limit: 6,
        media_dir: PathBuf::from("media"),
    }
}

pub(super) fn provider_principal(suffix: &str) -> SessionPrincipal {
    SessionPrincipal {
        account_id: AccountId(format!("acct-{suffix}")),
        display_name: "Jorge Mendoza".to_string(),
        role: AccountRole::Provider,
    }
}

pub(super) fn client_principal() -> SessionPrincipal {
    SessionPrincipal {
        account_id: AccountId("acct-client".to_string()),
        display_name: "Marta Soto".to_string(),
        role: AccountRole::Client,
    }
}

pub(super) fn admin_principal() -> SessionPrincipal {
    SessionPrincipal {
        account_id: AccountId("acct-admin".to_string()),
        display_name: "Mesa de Moderación".to_string(),
        role: AccountRole::Admin,
    }
}

pub(super) fn draft() -> ListingDraft {
    ListingDraft {
        title: "Casa con vista en Centro".to_string(),
        description: "Tres recámaras a dos cuadras del zócalo".to_string(),
        operation: "sale".to_string(),
        category: "house".to_string(),
        price: "1850000".to_string(),
        rooms: "3".to_string(),
        bathrooms: "2".to_string(),
        area_m2: "140".to_string(),
        street: "Av. Juárez 12".to_string(),
        unit: "A".to_string(),
        neighborhood: "Centro".to_string(),
        postal_code: "39300".to_string(),
        city: "Acapulco".to_string(),
        latitude: "16.8531".to_string(),
        longitude: "-99.8237".to_string(),
    }
}

pub(super) fn upload(file_name: &str) -> MediaUpload {
    MediaUpload {
        file_name: file_name.to_string(),
        bytes: vec![0xFF, 0xD8, 0xFF],
        principal: false,
    }
}

/// A stored listing with sensible defaults for filter tests. `age` pushes
/// `published_at` into the past so ordering is deterministic.
pub(super) fn listing(id: &str, age: Duration) -> Listing {
    Listing {
        id: ListingId(id.to_string()),
        owner: AccountId("acct-provider".to_string()),
        title: format!("Propiedad {id}"),
        description: "Descripción breve".to_string(),
        operation: OperationKind::Sale,
        category: PropertyCategory::House,
        price: 1_500_000.0,
        address: Address {
            street: "Calle 1".to_string(),
            unit: "1".to_string(),
            neighborhood: "Centro".to_string(),
            postal_code: "39300".to_string(),
            city: "Acapulco".to_string(),
        },
        coordinates: Coordinates {
            latitude: 16.85,
            longitude: -99.82,
        },
        rooms: 2,
        bathrooms: 1,
        area_m2: 90,
        status: ModerationStatus::Approved,
        featured: false,
        featured_until: None,
        available: true,
        published_at: Utc::now() - age,
        images: vec![ListingImage {
            url: format!("/media/{id}.jpg"),
            principal: true,
        }],
    }
}

pub(super) fn build_desk() -> (
    ListingDesk<MemoryListings, MemoryMedia>,
    Arc<MemoryListings>,
    Arc<MemoryMedia>,
    Arc<MemoryAudit>,
) {
    let listings = Arc::new(MemoryListings::default());
    let media = Arc::new(MemoryMedia::default());
    let audit = Arc::new(MemoryAudit::default());
    let desk = ListingDesk::new(
        listings.clone(),
        media.clone(),
        AuditRecorder::new(audit.clone()),
    );
    (desk, listings, media, audit)
}

pub(super) fn build_search(listings: Arc<MemoryListings>) -> SearchEngine<MemoryListings> {
    SearchEngine::new(listings, &market_config())
}

#[derive(Default)]
pub(super) struct MemoryListings {
    records: Mutex<HashMap<ListingId, Listing>>,
}

impl MemoryListings {
    pub(super) fn seed(&self, listing: Listing) {
        self.records
            .lock()
            .expect("listing mutex poisoned")
            .insert(listing.id.clone(), listing);
    }
}

impl ListingRepository for MemoryListings {
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
            .filter(|l| filter.matches(l))
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
            .filter(|l| l.address.city.eq_ignore_ascii_case(city))
            .map(|l| l.address.neighborhood.trim().to_string())
            .filter(|n| !n.is_empty())
            .collect();
        neighborhoods.sort();
        neighborhoods.dedup();
        Ok(neighborhoods)
    }
}

/// Repository that always fails, for the media-before-persist path.
pub(super) struct UnavailableListings;

impl ListingRepository for UnavailableListings {
    fn insert(&self, _listing: Listing) -> Result<Listing, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _listing: Listing) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &ListingId) -> Result<Option<Listing>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn find(
        &self,
        _filter: &ListingFilter,
        _limit: Option<usize>,
    ) -> Result<Vec<Listing>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn distinct_neighborhoods(&self, _city: &str) -> Result<Vec<String>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

#[derive(Default)]
pub(super) struct MemoryMedia {
    stored: Mutex<Vec<String>>,
}

impl MemoryMedia {
    pub(super) fn stored(&self) -> Vec<String> {
        self.stored.lock().expect("media mutex poisoned").clone()
    }
}

impl MediaStorage for MemoryMedia {
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
        Ok(self.entries.lock().expect("audit mutex poisoned").clone())
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
