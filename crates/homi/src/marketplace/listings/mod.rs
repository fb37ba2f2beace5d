//! The listing lifecycle: provider submission, moderation, and the
//! approved-only public search.

pub mod domain;
pub mod repository;
pub mod router;
pub mod search;
pub mod storage;
pub mod submission;

#[cfg(test)]
mod tests;

pub use domain::{
    Address, Coordinates, Listing, ListingId, ListingImage, ListingView, ModerationStatus,
    OperationKind, PropertyCategory,
};
pub use repository::{ListingFilter, ListingRepository};
pub use router::{listings_router, ListingsState};
pub use search::{SearchEngine, SearchQuery, SearchResults};
pub use storage::{sanitize_file_name, FsMediaStorage, MediaStorage, MediaStorageError};
pub use submission::{
    ListingDesk, ListingDraft, MediaUpload, ModerationDecision, SubmissionError,
    MAX_IMAGES_PER_LISTING,
};
