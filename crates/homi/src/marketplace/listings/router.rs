use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use super::domain::ListingId;
use super::repository::ListingRepository;
use super::search::{SearchEngine, SearchQuery};
use super::storage::MediaStorage;
use super::submission::{ListingDesk, ListingDraft, MediaUpload, ModerationDecision, SubmissionError};
use crate::marketplace::identity::{principal_from_headers, SessionStore};
use crate::marketplace::storage::RepositoryError;

/// Shared state for the listing routes: the submission desk, the search
/// engine, and the session store the handlers authenticate against.
pub struct ListingsState<R, M, S> {
    pub desk: Arc<ListingDesk<R, M>>,
    pub search: Arc<SearchEngine<R>>,
    pub sessions: Arc<S>,
}

impl<R, M, S> Clone for ListingsState<R, M, S> {
    fn clone(&self) -> Self {
        Self {
            desk: Arc::clone(&self.desk),
            search: Arc::clone(&self.search),
            sessions: Arc::clone(&self.sessions),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubmitListingRequest {
    #[serde(flatten)]
    pub(crate) draft: ListingDraft,
    #[serde(default)]
    pub(crate) images: Vec<MediaUpload>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ModerationRequest {
    pub(crate) decision: ModerationDecision,
}

/// Router builder for the public listing surface and the provider/admin
/// write paths.
pub fn listings_router<R, M, S>(state: ListingsState<R, M, S>) -> Router
where
    R: ListingRepository + 'static,
    M: MediaStorage + 'static,
    S: SessionStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/listings",
            get(front_page_handler::<R, M, S>).post(submit_handler::<R, M, S>),
        )
        .route("/api/v1/listings/search", get(search_handler::<R, M, S>))
        .route("/api/v1/listings/:listing_id", get(detail_handler::<R, M, S>))
        .route(
            "/api/v1/listings/:listing_id/moderation",
            post(moderate_handler::<R, M, S>),
        )
        .with_state(state)
}

pub(crate) async fn front_page_handler<R, M, S>(
    State(state): State<ListingsState<R, M, S>>,
) -> Response
where
    R: ListingRepository + 'static,
    M: MediaStorage + 'static,
    S: SessionStore + 'static,
{
    match state.search.front_page() {
        Ok(results) => (StatusCode::OK, Json(results)).into_response(),
        Err(err) => storage_error_response(err),
    }
}

pub(crate) async fn search_handler<R, M, S>(
    State(state): State<ListingsState<R, M, S>>,
    Query(query): Query<SearchQuery>,
) -> Response
where
    R: ListingRepository + 'static,
    M: MediaStorage + 'static,
    S: SessionStore + 'static,
{
    match state.search.search(query) {
        Ok(results) => (StatusCode::OK, Json(results)).into_response(),
        Err(err) => storage_error_response(err),
    }
}

pub(crate) async fn detail_handler<R, M, S>(
    State(state): State<ListingsState<R, M, S>>,
    Path(listing_id): Path<String>,
) -> Response
where
    R: ListingRepository + 'static,
    M: MediaStorage + 'static,
    S: SessionStore + 'static,
{
    match state.search.fetch_public(&ListingId(listing_id)) {
        Ok(Some(listing)) => (StatusCode::OK, Json(listing)).into_response(),
        Ok(None) => {
            let payload = json!({ "error": "listing not found" });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
        Err(err) => storage_error_response(err),
    }
}

pub(crate) async fn submit_handler<R, M, S>(
    State(state): State<ListingsState<R, M, S>>,
    headers: HeaderMap,
    Json(request): Json<SubmitListingRequest>,
) -> Response
where
    R: ListingRepository + 'static,
    M: MediaStorage + 'static,
    S: SessionStore + 'static,
{
    let principal = principal_from_headers(&headers, state.sessions.as_ref());

    match state
        .desk
        .submit(principal.as_ref(), request.draft, request.images)
    {
        Ok(listing) => (StatusCode::CREATED, Json(listing)).into_response(),
        Err(err) => submission_error_response(err),
    }
}

pub(crate) async fn moderate_handler<R, M, S>(
    State(state): State<ListingsState<R, M, S>>,
    headers: HeaderMap,
    Path(listing_id): Path<String>,
    Json(request): Json<ModerationRequest>,
) -> Response
where
    R: ListingRepository + 'static,
    M: MediaStorage + 'static,
    S: SessionStore + 'static,
{
    let Some(principal) = principal_from_headers(&headers, state.sessions.as_ref()) else {
        return submission_error_response(SubmissionError::AuthRequired);
    };

    match state
        .desk
        .moderate(&principal, &ListingId(listing_id), request.decision)
    {
        Ok(listing) => (StatusCode::OK, Json(listing)).into_response(),
        Err(err) => submission_error_response(err),
    }
}

fn submission_error_response(err: SubmissionError) -> Response {
    match err {
        SubmissionError::AuthRequired => {
            let payload = json!({ "error": "sign in to continue" });
            (StatusCode::UNAUTHORIZED, Json(payload)).into_response()
        }
        SubmissionError::ProviderRequired => {
            let payload = json!({ "error": "provider access required" });
            (StatusCode::FORBIDDEN, Json(payload)).into_response()
        }
        SubmissionError::AdminRequired => {
            let payload = json!({ "error": "administrator access required" });
            (StatusCode::FORBIDDEN, Json(payload)).into_response()
        }
        SubmissionError::Validation(fields) => {
            let payload = json!({
                "error": "required fields are missing or malformed",
                "fields": fields,
            });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
        SubmissionError::AlreadyModerated => {
            let payload = json!({ "error": "the listing has already been moderated" });
            (StatusCode::CONFLICT, Json(payload)).into_response()
        }
        SubmissionError::Storage(RepositoryError::NotFound) => {
            let payload = json!({ "error": "listing not found" });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
        SubmissionError::Media(err) => {
            warn!(%err, "media storage failure");
            let payload = json!({ "error": "the service is temporarily unavailable" });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
        SubmissionError::Storage(err) => {
            warn!(%err, "listing storage failure");
            let payload = json!({ "error": "the service is temporarily unavailable" });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}

fn storage_error_response(err: RepositoryError) -> Response {
    warn!(%err, "listing storage failure");
    let payload = json!({ "error": "the service is temporarily unavailable" });
    (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
}
