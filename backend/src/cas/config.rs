//! CAS provider configuration.
//!
//! `CasSettings` is the JSON document stored for a provider; missing fields
//! are filled with the conventional CAS paths and attribute names.
//! `ProviderConfig` is the validated value the client works with.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Errors caused by an unusable provider configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CasConfigError {
    #[error("Invalid service URL '{url}': {reason}")]
    InvalidServiceUrl { url: String, reason: String },
    #[error("Invalid CAS base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("Timeout must be greater than zero")]
    InvalidTimeout,
}

/// CAS protocol version, serialized as `"2.0"` / `"3.0"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CasVersion {
    #[default]
    #[serde(rename = "2.0")]
    V2,
    #[serde(rename = "3.0")]
    V3,
}

impl std::fmt::Display for CasVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CasVersion::V2 => write!(f, "2.0"),
            CasVersion::V3 => write!(f, "3.0"),
        }
    }
}

/// Relative paths of the CAS endpoints, appended to the base URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CasEndpoints {
    #[serde(default = "default_login")]
    pub login: String,
    #[serde(default = "default_logout")]
    pub logout: String,
    #[serde(default = "default_validate")]
    pub validate: String,
    #[serde(default = "default_validate_v3")]
    pub validate_v3: Option<String>,
}

impl Default for CasEndpoints {
    fn default() -> Self {
        Self {
            login: default_login(),
            logout: default_logout(),
            validate: default_validate(),
            validate_v3: default_validate_v3(),
        }
    }
}

fn default_login() -> String {
    "/login".to_string()
}

fn default_logout() -> String {
    "/logout".to_string()
}

fn default_validate() -> String {
    "/serviceValidate".to_string()
}

fn default_validate_v3() -> Option<String> {
    Some("/p3/serviceValidate".to_string())
}

/// Maps the application's identity fields to CAS attribute names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeMapping {
    #[serde(default = "default_employee_id")]
    pub employee_id: String,
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default = "default_full_name")]
    pub full_name: String,
    #[serde(default = "default_email")]
    pub email: String,
}

impl Default for AttributeMapping {
    fn default() -> Self {
        Self {
            employee_id: default_employee_id(),
            username: default_username(),
            full_name: default_full_name(),
            email: default_email(),
        }
    }
}

fn default_employee_id() -> String {
    "cas:user".to_string()
}

fn default_username() -> String {
    "cas:username".to_string()
}

fn default_full_name() -> String {
    "cas:name".to_string()
}

fn default_email() -> String {
    "cas:mail".to_string()
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

/// Provider settings as stored in the `sso_providers.settings` column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CasSettings {
    pub base_url: String,
    pub service_url: String,
    #[serde(default)]
    pub version: CasVersion,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub endpoints: CasEndpoints,
    #[serde(default)]
    pub attribute_mapping: AttributeMapping,
}

impl CasSettings {
    /// Checks the settings and turns them into a `ProviderConfig`.
    pub fn into_provider_config(self) -> Result<ProviderConfig, CasConfigError> {
        let config = ProviderConfig {
            base_url: self.base_url.trim_end_matches('/').to_string(),
            service_url: self.service_url,
            protocol_version: self.version,
            timeout_ms: self.timeout_ms,
            endpoints: self.endpoints,
            attribute_mapping: self.attribute_mapping,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Resolved configuration for one CAS provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub base_url: String,
    pub service_url: String,
    pub protocol_version: CasVersion,
    pub timeout_ms: u64,
    pub endpoints: CasEndpoints,
    pub attribute_mapping: AttributeMapping,
}

impl ProviderConfig {
    /// Validation path for the configured protocol version.
    ///
    /// CAS 3.0 uses `validate_v3` when one is configured and falls back to
    /// `validate` otherwise.
    pub fn validation_endpoint(&self) -> &str {
        match (self.protocol_version, &self.endpoints.validate_v3) {
            (CasVersion::V3, Some(path)) => path,
            _ => &self.endpoints.validate,
        }
    }

    /// Fails unless `service_url` is an absolute URL.
    pub fn ensure_service_url(&self) -> Result<Url, CasConfigError> {
        parse_absolute(&self.service_url).map_err(|reason| CasConfigError::InvalidServiceUrl {
            url: self.service_url.clone(),
            reason,
        })
    }

    pub fn validate(&self) -> Result<(), CasConfigError> {
        self.ensure_service_url()?;

        let base = parse_absolute(&self.base_url).map_err(|reason| {
            CasConfigError::InvalidBaseUrl {
                url: self.base_url.clone(),
                reason,
            }
        })?;
        if base
            .query_pairs()
            .any(|(key, _)| key == "ticket" || key == "service")
        {
            return Err(CasConfigError::InvalidBaseUrl {
                url: self.base_url.clone(),
                reason: "must not carry ticket or service parameters".to_string(),
            });
        }

        if self.timeout_ms == 0 {
            return Err(CasConfigError::InvalidTimeout);
        }

        Ok(())
    }
}

fn parse_absolute(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;
    if url.cannot_be_a_base() {
        return Err("not a hierarchical URL".to_string());
    }
    Ok(url)
}
