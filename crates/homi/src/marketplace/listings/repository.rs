use super::domain::{Listing, ListingId, ModerationStatus, OperationKind, PropertyCategory};
use crate::marketplace::storage::RepositoryError;

/// Conjunctive listing predicate. Every set member must hold; unset members
/// are ignored. `matches` is the single definition of the semantics so all
/// store implementations agree with the in-process tests.
#[derive(Debug, Clone, Default)]
pub struct ListingFilter {
    pub city: Option<String>,
    pub status: Option<ModerationStatus>,
    pub operation: Option<OperationKind>,
    pub categories: Option<Vec<PropertyCategory>>,
    pub neighborhood: Option<String>,
    pub keyword: Option<String>,
}

impl ListingFilter {
    pub fn matches(&self, listing: &Listing) -> bool {
        if let Some(city) = &self.city {
            if !listing.address.city.eq_ignore_ascii_case(city) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if listing.status != status {
                return false;
            }
        }
        if let Some(operation) = self.operation {
            if listing.operation != operation {
                return false;
            }
        }
        if let Some(categories) = &self.categories {
            if !categories.contains(&listing.category) {
                return false;
            }
        }
        if let Some(neighborhood) = &self.neighborhood {
            if !listing.address.neighborhood.eq_ignore_ascii_case(neighborhood) {
                return false;
            }
        }
        if let Some(keyword) = &self.keyword {
            let needle = keyword.to_lowercase();
            let in_title = listing.title.to_lowercase().contains(&needle);
            let in_description = listing.description.to_lowercase().contains(&needle);
            if !in_title && !in_description {
                return false;
            }
        }
        true
    }
}

/// Storage abstraction for listings.
pub trait ListingRepository: Send + Sync {
    fn insert(&self, listing: Listing) -> Result<Listing, RepositoryError>;
    /// Only the moderation path updates listings.
    fn update(&self, listing: Listing) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &ListingId) -> Result<Option<Listing>, RepositoryError>;
    /// Matching listings sorted by `published_at` descending, optionally
    /// truncated to `limit`.
    fn find(
        &self,
        filter: &ListingFilter,
        limit: Option<usize>,
    ) -> Result<Vec<Listing>, RepositoryError>;
    /// Distinct non-empty neighborhoods for the city, sorted ascending.
    fn distinct_neighborhoods(&self, city: &str) -> Result<Vec<String>, RepositoryError>;
}
