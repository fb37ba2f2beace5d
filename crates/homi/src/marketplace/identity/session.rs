use super::domain::SessionPrincipal;
use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};

/// Request header carrying the opaque session token.
pub const SESSION_HEADER: &str = "x-session-token";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionToken(pub String);

/// Opaque per-request identity carrier. `refresh` overwrites the principal
/// behind an existing token so a role upgrade becomes visible without a
/// re-login.
pub trait SessionStore: Send + Sync {
    fn create(&self, principal: SessionPrincipal) -> SessionToken;
    fn get(&self, token: &SessionToken) -> Option<SessionPrincipal>;
    fn refresh(&self, token: &SessionToken, principal: SessionPrincipal);
    fn destroy(&self, token: &SessionToken);
}

/// Resolve the calling principal from request headers, if any.
pub fn principal_from_headers<S: SessionStore + ?Sized>(
    headers: &HeaderMap,
    sessions: &S,
) -> Option<SessionPrincipal> {
    let token = headers.get(SESSION_HEADER)?.to_str().ok()?;
    sessions.get(&SessionToken(token.to_string()))
}

/// Extract the raw token from request headers.
pub fn token_from_headers(headers: &HeaderMap) -> Option<SessionToken> {
    let token = headers.get(SESSION_HEADER)?.to_str().ok()?;
    Some(SessionToken(token.to_string()))
}
