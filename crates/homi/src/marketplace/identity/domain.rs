use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountRole {
    Client,
    Provider,
    Admin,
}

impl AccountRole {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Provider => "provider",
            Self::Admin => "admin",
        }
    }

    /// Providers publish listings; admins may act on their behalf.
    pub const fn can_publish(self) -> bool {
        matches!(self, Self::Provider | Self::Admin)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    Active,
    Suspended,
}

impl AccountStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Suspended => "suspended",
        }
    }
}

/// Provider-only attributes, merged onto an account on upgrade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDetails {
    pub agency_name: Option<String>,
    pub tax_id: Option<String>,
    pub postal_code: Option<String>,
    #[serde(default)]
    pub social_links: Vec<String>,
    pub verified: bool,
}

/// A stored account. The password hash never crosses the HTTP boundary;
/// responses go through [`AccountView`].
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub first_surname: String,
    pub second_surname: Option<String>,
    /// Stored lowercased; the repository enforces uniqueness on this value.
    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub role: AccountRole,
    pub status: AccountStatus,
    pub provider: Option<ProviderDetails>,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.name, self.first_surname)
    }

    pub fn principal(&self) -> SessionPrincipal {
        SessionPrincipal {
            account_id: self.id.clone(),
            display_name: self.display_name(),
            role: self.role,
        }
    }

    pub fn view(&self) -> AccountView {
        AccountView {
            id: self.id.clone(),
            name: self.name.clone(),
            first_surname: self.first_surname.clone(),
            second_surname: self.second_surname.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            role: self.role,
            status: self.status,
            provider: self.provider.clone(),
            created_at: self.created_at,
        }
    }
}

/// Sanitized account representation for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct AccountView {
    pub id: AccountId,
    pub name: String,
    pub first_surname: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub second_surname: Option<String>,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub role: AccountRole,
    pub status: AccountStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderDetails>,
    pub created_at: DateTime<Utc>,
}

/// Identity snapshot carried by the session collaborator. Read at request
/// start; a mid-session role change is visible on the next request unless
/// the mutating operation refreshes the session explicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionPrincipal {
    pub account_id: AccountId,
    pub display_name: String,
    pub role: AccountRole,
}

/// Role-tagged registration drafts. Clients and providers have different
/// mandatory field sets; validation lives in the identity service.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum RegistrationDraft {
    Client(ClientDraft),
    Provider(ProviderDraft),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientDraft {
    pub name: String,
    pub first_surname: String,
    #[serde(default)]
    pub second_surname: Option<String>,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub password: String,
    pub password_confirmation: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderDraft {
    pub name: String,
    pub first_surname: String,
    pub second_surname: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub password_confirmation: String,
    #[serde(default)]
    pub agency_name: Option<String>,
    #[serde(default)]
    pub tax_id: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub social_links: Vec<String>,
}

/// Fields accepted when a client upgrades to provider. The current password
/// is always required as credential proof.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderUpgrade {
    pub current_password: String,
    #[serde(default)]
    pub second_surname: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub agency_name: Option<String>,
    #[serde(default)]
    pub tax_id: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub social_links: Vec<String>,
}

/// Profile edit request. Every change requires proof of the current
/// password; all members besides the proof are optional.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileUpdate {
    pub current_password: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub new_password: Option<String>,
    #[serde(default)]
    pub password_confirmation: Option<String>,
}
