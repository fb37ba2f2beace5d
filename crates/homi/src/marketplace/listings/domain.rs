use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::marketplace::identity::AccountId;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListingId(pub String);

/// Whether a property is offered for sale or for rent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Sale,
    Rental,
}

impl OperationKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Sale => "sale",
            Self::Rental => "rental",
        }
    }

    /// Case-insensitive parse; filter matching goes through typed equality.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "sale" => Some(Self::Sale),
            "rental" => Some(Self::Rental),
            _ => None,
        }
    }
}

impl Serialize for OperationKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for OperationKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown operation '{raw}'")))
    }
}

/// Open-set property category. The well-known variants cover the filter
/// UI; anything else round-trips through `Other` unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyCategory {
    House,
    Apartment,
    Land,
    Condo,
    Commercial,
    Other(String),
}

impl PropertyCategory {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "house" => Self::House,
            "apartment" => Self::Apartment,
            "land" => Self::Land,
            "condo" => Self::Condo,
            "commercial" => Self::Commercial,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::House => "house",
            Self::Apartment => "apartment",
            Self::Land => "land",
            Self::Condo => "condo",
            Self::Commercial => "commercial",
            Self::Other(name) => name,
        }
    }

    /// The fixed secondary bucket behind the "more categories" toggle.
    pub fn extra_bucket() -> [Self; 3] {
        [Self::Condo, Self::Commercial, Self::Land]
    }
}

impl Serialize for PropertyCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PropertyCategory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// The moderation gate controlling public visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ModerationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub unit: String,
    pub neighborhood: String,
    pub postal_code: String,
    pub city: String,
}

/// Informational only; proximity queries are out of scope.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// An image owned by exactly one listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingImage {
    pub url: String,
    pub principal: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub owner: AccountId,
    pub title: String,
    pub description: String,
    pub operation: OperationKind,
    pub category: PropertyCategory,
    pub price: f64,
    pub address: Address,
    pub coordinates: Coordinates,
    pub rooms: u32,
    pub bathrooms: u32,
    pub area_m2: u32,
    pub status: ModerationStatus,
    pub featured: bool,
    pub featured_until: Option<DateTime<Utc>>,
    pub available: bool,
    pub published_at: DateTime<Utc>,
    pub images: Vec<ListingImage>,
}

impl Listing {
    /// The designated principal image, or the first in sequence by
    /// convention when none is flagged.
    pub fn principal_image(&self) -> Option<&ListingImage> {
        self.images
            .iter()
            .find(|image| image.principal)
            .or_else(|| self.images.first())
    }

    pub fn summary_view(&self) -> ListingView {
        ListingView {
            id: self.id.clone(),
            title: self.title.clone(),
            operation: self.operation,
            category: self.category.clone(),
            price: self.price,
            neighborhood: self.address.neighborhood.clone(),
            city: self.address.city.clone(),
            rooms: self.rooms,
            bathrooms: self.bathrooms,
            area_m2: self.area_m2,
            featured: self.featured,
            available: self.available,
            published_at: self.published_at,
            principal_image_url: self.principal_image().map(|image| image.url.clone()),
        }
    }
}

/// Card-sized listing representation for search results and the home page.
#[derive(Debug, Clone, Serialize)]
pub struct ListingView {
    pub id: ListingId,
    pub title: String,
    pub operation: OperationKind,
    pub category: PropertyCategory,
    pub price: f64,
    pub neighborhood: String,
    pub city: String,
    pub rooms: u32,
    pub bathrooms: u32,
    pub area_m2: u32,
    pub featured: bool,
    pub available: bool,
    pub published_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal_image_url: Option<String>,
}
