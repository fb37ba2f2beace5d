use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::domain::{
    Listing, ListingId, ListingView, ModerationStatus, OperationKind, PropertyCategory,
};
use super::repository::{ListingFilter, ListingRepository};
use crate::config::MarketConfig;
use crate::marketplace::storage::RepositoryError;

/// Public search parameters. `extra` widens the category filter to the
/// fixed secondary bucket; an explicit `category` always wins over it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub operation: Option<OperationKind>,
    #[serde(default)]
    pub category: Option<PropertyCategory>,
    #[serde(default)]
    pub neighborhood: Option<String>,
    #[serde(default)]
    pub keyword: Option<String>,
    #[serde(default)]
    pub extra: bool,
}

/// Search output: the matching listing cards plus the recomputed
/// neighborhood facet so filter UIs can repopulate.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
    pub city: String,
    pub listings: Vec<ListingView>,
    pub neighborhoods: Vec<String>,
}

/// Query builder over the listing repository. The city scope is injected
/// configuration; the approved-only gate is hard-wired here and is not
/// reachable from any caller-supplied parameter.
pub struct SearchEngine<R> {
    listings: Arc<R>,
    city: String,
    front_page_limit: usize,
}

impl<R> SearchEngine<R>
where
    R: ListingRepository + 'static,
{
    pub fn new(listings: Arc<R>, market: &MarketConfig) -> Self {
        Self {
            listings,
            city: market.city.clone(),
            front_page_limit: market.front_page_limit,
        }
    }

    pub fn search(&self, query: SearchQuery) -> Result<SearchResults, RepositoryError> {
        let filter = self.public_filter(query);
        let listings = self.listings.find(&filter, None)?;
        self.results(listings)
    }

    /// Recent approved listings for the home page, capped by configuration.
    pub fn front_page(&self) -> Result<SearchResults, RepositoryError> {
        let filter = ListingFilter {
            city: Some(self.city.clone()),
            status: Some(ModerationStatus::Approved),
            ..ListingFilter::default()
        };
        let listings = self.listings.find(&filter, Some(self.front_page_limit))?;
        self.results(listings)
    }

    /// Public detail lookup; anything not yet approved stays invisible.
    pub fn fetch_public(&self, id: &ListingId) -> Result<Option<Listing>, RepositoryError> {
        Ok(self
            .listings
            .fetch(id)?
            .filter(|listing| listing.status == ModerationStatus::Approved))
    }

    fn results(&self, listings: Vec<Listing>) -> Result<SearchResults, RepositoryError> {
        let neighborhoods = self.listings.distinct_neighborhoods(&self.city)?;
        Ok(SearchResults {
            city: self.city.clone(),
            listings: listings.iter().map(Listing::summary_view).collect(),
            neighborhoods,
        })
    }

    fn public_filter(&self, query: SearchQuery) -> ListingFilter {
        let categories = match (query.category, query.extra) {
            // An explicit category always wins; the extra toggle is ignored.
            (Some(category), _) => Some(vec![category]),
            (None, true) => Some(PropertyCategory::extra_bucket().to_vec()),
            (None, false) => None,
        };

        ListingFilter {
            city: Some(self.city.clone()),
            // Not caller-controllable: only approved listings are public.
            status: Some(ModerationStatus::Approved),
            operation: query.operation,
            categories,
            neighborhood: query.neighborhood.filter(|n| !n.trim().is_empty()),
            keyword: query.keyword.filter(|k| !k.trim().is_empty()),
        }
    }
}
