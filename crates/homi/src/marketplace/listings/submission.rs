use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::domain::{
    Address, Coordinates, Listing, ListingId, ListingImage, ModerationStatus, OperationKind,
    PropertyCategory,
};
use super::repository::ListingRepository;
use super::storage::{sanitize_file_name, MediaStorage, MediaStorageError};
use crate::marketplace::audit::AuditRecorder;
use crate::marketplace::identity::{AccountRole, SessionPrincipal};
use crate::marketplace::storage::RepositoryError;
use crate::marketplace::validation::{require_text, FieldError};

/// At most five media uploads per submission.
pub const MAX_IMAGES_PER_LISTING: usize = 5;

/// Raw listing draft as submitted. Numeric members stay textual so a parse
/// failure is a recoverable validation error carrying the offending field,
/// never a deserialization fault.
#[derive(Debug, Clone, Deserialize)]
pub struct ListingDraft {
    pub title: String,
    pub description: String,
    pub operation: String,
    pub category: String,
    pub price: String,
    #[serde(default)]
    pub rooms: String,
    #[serde(default)]
    pub bathrooms: String,
    #[serde(default)]
    pub area_m2: String,
    pub street: String,
    pub unit: String,
    pub neighborhood: String,
    pub postal_code: String,
    pub city: String,
    pub latitude: String,
    pub longitude: String,
}

/// One optional media upload slot.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
    #[serde(default)]
    pub principal: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationDecision {
    Approve,
    Reject,
}

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("sign in to publish a listing")]
    AuthRequired,
    #[error("only provider accounts can publish listings")]
    ProviderRequired,
    #[error("only administrators can moderate listings")]
    AdminRequired,
    #[error("the listing draft has missing or malformed fields")]
    Validation(Vec<FieldError>),
    #[error("the listing has already been moderated")]
    AlreadyModerated,
    #[error(transparent)]
    Media(#[from] MediaStorageError),
    #[error(transparent)]
    Storage(#[from] RepositoryError),
}

struct ValidatedDraft {
    title: String,
    description: String,
    operation: OperationKind,
    category: PropertyCategory,
    price: f64,
    rooms: u32,
    bathrooms: u32,
    area_m2: u32,
    address: Address,
    coordinates: Coordinates,
}

static LISTING_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_listing_id() -> ListingId {
    let id = LISTING_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ListingId(format!("prop-{id:06}"))
}

/// The submission pipeline: validate, persist media, write the pending
/// record. Media writes land before the repository write; a crash in
/// between can leave orphaned files, which is accepted and reconciled by
/// an external sweep rather than rolled back here.
pub struct ListingDesk<R, M> {
    listings: Arc<R>,
    media: Arc<M>,
    audit: AuditRecorder,
}

impl<R, M> ListingDesk<R, M>
where
    R: ListingRepository + 'static,
    M: MediaStorage + 'static,
{
    pub fn new(listings: Arc<R>, media: Arc<M>, audit: AuditRecorder) -> Self {
        Self {
            listings,
            media,
            audit,
        }
    }

    /// Run a submission attempt end to end.
    ///
    /// Validation happens before any media write, so a rejected draft
    /// touches neither the media store nor the repository.
    pub fn submit(
        &self,
        principal: Option<&SessionPrincipal>,
        draft: ListingDraft,
        uploads: Vec<MediaUpload>,
    ) -> Result<Listing, SubmissionError> {
        let Some(principal) = principal else {
            return Err(SubmissionError::AuthRequired);
        };
        if !principal.role.can_publish() {
            return Err(SubmissionError::ProviderRequired);
        }

        let validated = validate_draft(&draft)?;
        let images = self.store_uploads(&uploads)?;

        let listing = Listing {
            id: next_listing_id(),
            owner: principal.account_id.clone(),
            title: validated.title,
            description: validated.description,
            operation: validated.operation,
            category: validated.category,
            price: validated.price,
            address: validated.address,
            coordinates: validated.coordinates,
            rooms: validated.rooms,
            bathrooms: validated.bathrooms,
            area_m2: validated.area_m2,
            status: ModerationStatus::Pending,
            featured: false,
            featured_until: None,
            available: true,
            published_at: Utc::now(),
            images,
        };

        let stored = match self.listings.insert(listing) {
            Ok(stored) => stored,
            Err(err) => {
                // Media written above stays behind; the periodic
                // reconciliation sweep owns the cleanup.
                warn!(%err, "listing persist failed after media writes");
                return Err(err.into());
            }
        };

        self.audit.record(
            Some(principal.account_id.clone()),
            "listing.submitted",
            format!("{} submitted '{}'", principal.display_name, stored.title),
        );
        Ok(stored)
    }

    /// Approve or reject a pending listing (admin surface).
    pub fn moderate(
        &self,
        actor: &SessionPrincipal,
        id: &ListingId,
        decision: ModerationDecision,
    ) -> Result<Listing, SubmissionError> {
        if actor.role != AccountRole::Admin {
            return Err(SubmissionError::AdminRequired);
        }

        let mut listing = self
            .listings
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?;
        if listing.status != ModerationStatus::Pending {
            return Err(SubmissionError::AlreadyModerated);
        }

        let (status, action) = match decision {
            ModerationDecision::Approve => (ModerationStatus::Approved, "listing.approved"),
            ModerationDecision::Reject => (ModerationStatus::Rejected, "listing.rejected"),
        };
        listing.status = status;
        self.listings.update(listing.clone())?;

        self.audit.record(
            Some(actor.account_id.clone()),
            action,
            format!("listing {} is now {}", listing.id.0, status.label()),
        );
        Ok(listing)
    }

    fn store_uploads(&self, uploads: &[MediaUpload]) -> Result<Vec<ListingImage>, SubmissionError> {
        if uploads.len() > MAX_IMAGES_PER_LISTING {
            return Err(SubmissionError::Validation(vec![FieldError::new(
                "images",
                format!("at most {MAX_IMAGES_PER_LISTING} images per listing"),
            )]));
        }

        let batch = Utc::now().timestamp_millis();
        let mut images = Vec::new();
        for (index, upload) in uploads.iter().enumerate() {
            // Photo slots are optional; an empty one is skipped, not an error.
            if upload.bytes.is_empty() {
                continue;
            }
            let name = format!("{batch}-{index}-{}", sanitize_file_name(&upload.file_name));
            let url = self.media.store(&upload.bytes, &name)?;
            images.push(ListingImage {
                url,
                principal: upload.principal,
            });
        }

        // First stored image is principal unless the caller designated one.
        if !images.is_empty() && !images.iter().any(|image| image.principal) {
            images[0].principal = true;
        }
        Ok(images)
    }
}

fn validate_draft(draft: &ListingDraft) -> Result<ValidatedDraft, SubmissionError> {
    let mut errors = Vec::new();

    let title = require_text(&mut errors, "title", &draft.title);
    let description = require_text(&mut errors, "description", &draft.description);
    let street = require_text(&mut errors, "street", &draft.street);
    let unit = require_text(&mut errors, "unit", &draft.unit);
    let neighborhood = require_text(&mut errors, "neighborhood", &draft.neighborhood);
    let postal_code = require_text(&mut errors, "postal_code", &draft.postal_code);
    let city = require_text(&mut errors, "city", &draft.city);

    let operation = match require_text(&mut errors, "operation", &draft.operation) {
        Some(raw) => match OperationKind::parse(&raw) {
            Some(operation) => Some(operation),
            None => {
                errors.push(FieldError::new("operation", "must be sale or rental"));
                None
            }
        },
        None => None,
    };
    let category =
        require_text(&mut errors, "category", &draft.category).map(|raw| PropertyCategory::parse(&raw));

    let price = parse_decimal(&mut errors, "price", &draft.price, true);
    let latitude = parse_decimal(&mut errors, "latitude", &draft.latitude, false);
    let longitude = parse_decimal(&mut errors, "longitude", &draft.longitude, false);
    let rooms = parse_count(&mut errors, "rooms", &draft.rooms);
    let bathrooms = parse_count(&mut errors, "bathrooms", &draft.bathrooms);
    let area_m2 = parse_count(&mut errors, "area_m2", &draft.area_m2);

    if !errors.is_empty() {
        return Err(SubmissionError::Validation(errors));
    }

    // All unwraps below are guarded by the emptiness check above.
    Ok(ValidatedDraft {
        title: title.unwrap_or_default(),
        description: description.unwrap_or_default(),
        operation: operation.unwrap_or(OperationKind::Sale),
        category: category.unwrap_or(PropertyCategory::House),
        price: price.unwrap_or_default(),
        rooms: rooms.unwrap_or_default(),
        bathrooms: bathrooms.unwrap_or_default(),
        area_m2: area_m2.unwrap_or_default(),
        address: Address {
            street: street.unwrap_or_default(),
            unit: unit.unwrap_or_default(),
            neighborhood: neighborhood.unwrap_or_default(),
            postal_code: postal_code.unwrap_or_default(),
            city: city.unwrap_or_default(),
        },
        coordinates: Coordinates {
            latitude: latitude.unwrap_or_default(),
            longitude: longitude.unwrap_or_default(),
        },
    })
}

fn parse_decimal(
    errors: &mut Vec<FieldError>,
    field: &'static str,
    raw: &str,
    non_negative: bool,
) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        errors.push(FieldError::required(field));
        return None;
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => {
            if non_negative && value < 0.0 {
                errors.push(FieldError::new(field, "cannot be negative"));
                None
            } else {
                Some(value)
            }
        }
        _ => {
            errors.push(FieldError::new(field, "must be a decimal number"));
            None
        }
    }
}

/// Counts default to zero when the slot arrives empty.
fn parse_count(errors: &mut Vec<FieldError>, field: &'static str, raw: &str) -> Option<u32> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Some(0);
    }
    match trimmed.parse::<u32>() {
        Ok(value) => Some(value),
        Err(_) => {
            errors.push(FieldError::new(field, "must be a whole number"));
            None
        }
    }
}
