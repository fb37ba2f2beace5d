use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use axum::Router;
use serde_json::json;

use homi::marketplace::audit::{audit_router, AuditState, AuditStore};
use homi::marketplace::identity::{
    identity_router, AccountRepository, CredentialHasher, IdentityState, SessionStore,
};
use homi::marketplace::listings::{
    listings_router, ListingRepository, ListingsState, MediaStorage,
};

/// Merge the marketplace routers and attach the operational endpoints.
pub(crate) fn with_marketplace_routes<R, H, L, M, S, A>(
    identity: IdentityState<R, H, S>,
    listings: ListingsState<L, M, S>,
    audit: AuditState<A, R, S>,
) -> Router
where
    R: AccountRepository + 'static,
    H: CredentialHasher + 'static,
    L: ListingRepository + 'static,
    M: MediaStorage + 'static,
    S: SessionStore + 'static,
    A: AuditStore + 'static,
{
    identity_router(identity)
        .merge(listings_router(listings))
        .merge(audit_router(audit))
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
