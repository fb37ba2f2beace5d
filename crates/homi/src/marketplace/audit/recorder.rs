use std::sync::Arc;

use chrono::Utc;
use tracing::warn;

use super::domain::{AuditEntry, AuditEntryView};
use super::store::AuditStore;
use crate::marketplace::identity::{AccountId, AccountRepository};
use crate::marketplace::storage::RepositoryError;

/// Fire-and-forget audit writer handed to the services.
///
/// Append failures are swallowed and reported only through the log; the
/// triggering business operation must never observe them.
#[derive(Clone)]
pub struct AuditRecorder {
    store: Arc<dyn AuditStore>,
}

impl AuditRecorder {
    pub fn new(store: Arc<dyn AuditStore>) -> Self {
        Self { store }
    }

    pub fn record(&self, actor: Option<AccountId>, action: &str, detail: impl Into<String>) {
        let entry = AuditEntry {
            actor,
            action: action.to_string(),
            detail: detail.into(),
            occurred_at: Utc::now(),
        };
        if let Err(err) = self.store.append(entry) {
            warn!(%err, action, "audit append failed; operation continues");
        }
    }
}

/// Administrative read side: audit entries joined with the actor's display
/// name, newest first.
pub struct AuditTrail<S, R> {
    store: Arc<S>,
    accounts: Arc<R>,
}

impl<S, R> AuditTrail<S, R>
where
    S: AuditStore,
    R: AccountRepository,
{
    pub fn new(store: Arc<S>, accounts: Arc<R>) -> Self {
        Self { store, accounts }
    }

    pub fn list(&self) -> Result<Vec<AuditEntryView>, RepositoryError> {
        let mut views = Vec::new();
        for entry in self.store.entries()? {
            let actor_name = match &entry.actor {
                Some(id) => self.accounts.fetch(id)?.map(|a| a.display_name()),
                None => None,
            };
            views.push(AuditEntryView {
                actor_id: entry.actor,
                actor_name,
                action: entry.action,
                detail: entry.detail,
                occurred_at: entry.occurred_at,
            });
        }
        Ok(views)
    }
}
