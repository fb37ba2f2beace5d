use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tracing::warn;

use super::recorder::AuditTrail;
use super::store::AuditStore;
use crate::marketplace::identity::{
    principal_from_headers, AccountRepository, AccountRole, SessionStore,
};

pub struct AuditState<S, R, T> {
    pub trail: Arc<AuditTrail<S, R>>,
    pub sessions: Arc<T>,
}

impl<S, R, T> Clone for AuditState<S, R, T> {
    fn clone(&self) -> Self {
        Self {
            trail: Arc::clone(&self.trail),
            sessions: Arc::clone(&self.sessions),
        }
    }
}

/// Administrative view over the audit trail.
pub fn audit_router<S, R, T>(state: AuditState<S, R, T>) -> Router
where
    S: AuditStore + 'static,
    R: AccountRepository + 'static,
    T: SessionStore + 'static,
{
    Router::new()
        .route("/api/v1/admin/audit", get(list_handler::<S, R, T>))
        .with_state(state)
}

pub(crate) async fn list_handler<S, R, T>(
    State(state): State<AuditState<S, R, T>>,
    headers: HeaderMap,
) -> Response
where
    S: AuditStore + 'static,
    R: AccountRepository + 'static,
    T: SessionStore + 'static,
{
    let Some(principal) = principal_from_headers(&headers, state.sessions.as_ref()) else {
        let payload = json!({ "error": "sign in to continue" });
        return (StatusCode::UNAUTHORIZED, Json(payload)).into_response();
    };
    if principal.role != AccountRole::Admin {
        let payload = json!({ "error": "administrator access required" });
        return (StatusCode::FORBIDDEN, Json(payload)).into_response();
    }

    match state.trail.list() {
        Ok(entries) => (StatusCode::OK, Json(json!({ "entries": entries }))).into_response(),
        Err(err) => {
            warn!(%err, "audit trail read failure");
            let payload = json!({ "error": "the service is temporarily unavailable" });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}
