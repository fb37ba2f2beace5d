use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use super::domain::{AccountId, AccountRole, ProfileUpdate, ProviderUpgrade, RegistrationDraft};
use super::password::CredentialHasher;
use super::repository::AccountRepository;
use super::service::{IdentityError, IdentityService, UpgradeOutcome};
use super::session::{principal_from_headers, token_from_headers, SessionStore};

/// Shared state for the identity routes: the service plus the session
/// collaborator the handlers read and write.
pub struct IdentityState<R, H, S> {
    pub service: Arc<IdentityService<R, H>>,
    pub sessions: Arc<S>,
}

impl<R, H, S> Clone for IdentityState<R, H, S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            sessions: Arc::clone(&self.sessions),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CredentialsRequest {
    pub(crate) email: String,
    pub(crate) password: String,
}

/// Router builder exposing registration, sessions, and profile endpoints.
pub fn identity_router<R, H, S>(state: IdentityState<R, H, S>) -> Router
where
    R: AccountRepository + 'static,
    H: CredentialHasher + 'static,
    S: SessionStore + 'static,
{
    Router::new()
        .route("/api/v1/accounts", post(register_handler::<R, H, S>))
        .route(
            "/api/v1/sessions",
            post(login_handler::<R, H, S>).delete(logout_handler::<R, H, S>),
        )
        .route("/api/v1/profile", put(profile_handler::<R, H, S>))
        .route(
            "/api/v1/provider-upgrade",
            post(upgrade_handler::<R, H, S>),
        )
        .route(
            "/api/v1/admin/accounts/:account_id/suspend",
            post(suspend_handler::<R, H, S>),
        )
        .with_state(state)
}

pub(crate) async fn register_handler<R, H, S>(
    State(state): State<IdentityState<R, H, S>>,
    Json(draft): Json<RegistrationDraft>,
) -> Response
where
    R: AccountRepository + 'static,
    H: CredentialHasher + 'static,
    S: SessionStore + 'static,
{
    match state.service.register(draft) {
        Ok(account) => (StatusCode::CREATED, Json(account.view())).into_response(),
        Err(err) => identity_error_response(err),
    }
}

pub(crate) async fn login_handler<R, H, S>(
    State(state): State<IdentityState<R, H, S>>,
    Json(credentials): Json<CredentialsRequest>,
) -> Response
where
    R: AccountRepository + 'static,
    H: CredentialHasher + 'static,
    S: SessionStore + 'static,
{
    match state
        .service
        .authenticate(&credentials.email, &credentials.password)
    {
        Ok(principal) => {
            let token = state.sessions.create(principal.clone());
            let payload = json!({
                "token": token,
                "principal": principal,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => identity_error_response(err),
    }
}

pub(crate) async fn logout_handler<R, H, S>(
    State(state): State<IdentityState<R, H, S>>,
    headers: HeaderMap,
) -> Response
where
    R: AccountRepository + 'static,
    H: CredentialHasher + 'static,
    S: SessionStore + 'static,
{
    if let Some(token) = token_from_headers(&headers) {
        state.sessions.destroy(&token);
    }
    StatusCode::NO_CONTENT.into_response()
}

pub(crate) async fn profile_handler<R, H, S>(
    State(state): State<IdentityState<R, H, S>>,
    headers: HeaderMap,
    Json(update): Json<ProfileUpdate>,
) -> Response
where
    R: AccountRepository + 'static,
    H: CredentialHasher + 'static,
    S: SessionStore + 'static,
{
    let Some(principal) = principal_from_headers(&headers, state.sessions.as_ref()) else {
        return auth_required_response();
    };

    match state.service.update_profile(&principal.account_id, update) {
        Ok(account) => (StatusCode::OK, Json(account.view())).into_response(),
        Err(IdentityError::NotFound) => {
            // The session points at an account that no longer resolves;
            // drop the session and ask the caller to sign in again.
            if let Some(token) = token_from_headers(&headers) {
                state.sessions.destroy(&token);
            }
            auth_required_response()
        }
        Err(err) => identity_error_response(err),
    }
}

pub(crate) async fn upgrade_handler<R, H, S>(
    State(state): State<IdentityState<R, H, S>>,
    headers: HeaderMap,
    Json(upgrade): Json<ProviderUpgrade>,
) -> Response
where
    R: AccountRepository + 'static,
    H: CredentialHasher + 'static,
    S: SessionStore + 'static,
{
    let Some(principal) = principal_from_headers(&headers, state.sessions.as_ref()) else {
        return auth_required_response();
    };

    match state
        .service
        .upgrade_to_provider(&principal.account_id, upgrade)
    {
        Ok(UpgradeOutcome::Upgraded { account, principal }) => {
            // Refresh the caller's session so the new role is visible on
            // this very request, not just the next login.
            if let Some(token) = token_from_headers(&headers) {
                state.sessions.refresh(&token, principal.clone());
            }
            let payload = json!({
                "upgraded": true,
                "account": account.view(),
                "principal": principal,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Ok(UpgradeOutcome::AlreadyProvider { account }) => {
            let payload = json!({
                "upgraded": false,
                "account": account.view(),
                "note": "account already has provider privileges",
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => identity_error_response(err),
    }
}

pub(crate) async fn suspend_handler<R, H, S>(
    State(state): State<IdentityState<R, H, S>>,
    headers: HeaderMap,
    Path(account_id): Path<String>,
) -> Response
where
    R: AccountRepository + 'static,
    H: CredentialHasher + 'static,
    S: SessionStore + 'static,
{
    let Some(principal) = principal_from_headers(&headers, state.sessions.as_ref()) else {
        return auth_required_response();
    };
    if principal.role != AccountRole::Admin {
        let payload = json!({ "error": "administrator access required" });
        return (StatusCode::FORBIDDEN, Json(payload)).into_response();
    }

    match state
        .service
        .suspend(&principal, &AccountId(account_id))
    {
        Ok(account) => (StatusCode::OK, Json(account.view())).into_response(),
        Err(err) => identity_error_response(err),
    }
}

pub(crate) fn auth_required_response() -> Response {
    let payload = json!({ "error": "sign in to continue" });
    (StatusCode::UNAUTHORIZED, Json(payload)).into_response()
}

fn identity_error_response(err: IdentityError) -> Response {
    match err {
        IdentityError::Validation(fields) => {
            let payload = json!({
                "error": "required fields are missing or malformed",
                "fields": fields,
            });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
        IdentityError::WeakPassword(weaknesses) => {
            let reasons: Vec<&str> = weaknesses
                .iter()
                .map(|w| w.description())
                .collect();
            let payload = json!({
                "error": "the password does not meet the strength policy",
                "password": reasons,
            });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
        IdentityError::DuplicateEmail => {
            let payload = json!({ "error": "the email address is already registered" });
            (StatusCode::CONFLICT, Json(payload)).into_response()
        }
        IdentityError::InvalidCredentials => {
            let payload = json!({ "error": "invalid email or password" });
            (StatusCode::UNAUTHORIZED, Json(payload)).into_response()
        }
        IdentityError::WrongPassword => {
            let payload = json!({ "error": "the current password is incorrect" });
            (StatusCode::FORBIDDEN, Json(payload)).into_response()
        }
        IdentityError::NotFound => {
            let payload = json!({ "error": "account not found" });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
        IdentityError::Storage(err) => {
            warn!(%err, "identity storage failure");
            let payload = json!({ "error": "the service is temporarily unavailable" });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
        IdentityError::Hash(err) => {
            warn!(%err, "credential hashing failure");
            let payload = json!({ "error": "the service is temporarily unavailable" });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}
