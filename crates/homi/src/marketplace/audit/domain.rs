use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::marketplace::identity::AccountId;

/// One immutable audit record. `actor` is `None` for system-generated
/// entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub actor: Option<AccountId>,
    pub action: String,
    pub detail: String,
    pub occurred_at: DateTime<Utc>,
}

/// Read-side view joined with the actor's identity. Entries survive an
/// unresolvable actor: `actor_name` is simply absent.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntryView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<AccountId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_name: Option<String>,
    pub action: String,
    pub detail: String,
    pub occurred_at: DateTime<Utc>,
}
