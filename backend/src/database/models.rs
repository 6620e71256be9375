//! Rust structs that represent database table mappings.
//!
//! These models define the structure of data as it is stored in and retrieved
//! from the database. Note that these may differ from API-specific models.

use crate::cas::CasSettings;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Protocol identifier stored for CAS providers.
pub const CAS_PROTOCOL: &str = "cas";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SsoProvider {
    pub id: String,
    pub name: String,
    pub protocol: String,
    /// Protocol settings as a JSON document.
    pub settings: String,
    pub is_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl SsoProvider {
    pub fn is_cas(&self) -> bool {
        self.protocol.eq_ignore_ascii_case(CAS_PROTOCOL)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateSsoProvider {
    #[validate(length(min = 1, message = "Provider ID is required"))]
    pub id: String,
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    #[validate(length(min = 1, message = "Protocol is required"))]
    pub protocol: String,
    #[validate(length(min = 2, message = "Settings are required"))]
    pub settings: String,
    pub is_enabled: bool,
}

/// Payload for registering a CAS provider through the API.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateCasProviderRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    pub settings: CasSettings,
    #[serde(default = "default_enabled")]
    pub is_enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// Provider as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SsoProviderInfo {
    pub id: String,
    pub name: String,
    pub protocol: String,
    pub is_enabled: bool,
    pub settings: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<SsoProvider> for SsoProviderInfo {
    fn from(provider: SsoProvider) -> Self {
        let settings = serde_json::from_str(&provider.settings)
            .unwrap_or(serde_json::Value::String(provider.settings));
        Self {
            id: provider.id,
            name: provider.name,
            protocol: provider.protocol,
            is_enabled: provider.is_enabled,
            settings,
            created_at: provider.created_at,
            updated_at: provider.updated_at,
        }
    }
}
